use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::server::api::{self, PayloadError};
use crate::stats::BattleStatsEngine;

pub struct HttpResponse {
    pub status_code: u16,
    pub status_text: &'static str,
    pub content_type: &'static str,
    pub body: String,
}

impl IntoResponse for HttpResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, [(header::CONTENT_TYPE, self.content_type)], self.body).into_response()
    }
}

pub fn route_request(
    engine: &BattleStatsEngine,
    method: &str,
    path: &str,
    body: &str,
) -> HttpResponse {
    let route = path.split('?').next().unwrap_or(path);
    match (method, route) {
        ("GET", "/") => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "text/html; charset=utf-8",
            body: index_html(),
        },
        ("GET", "/api/health") => json_response(api::health_payload()),
        ("GET", "/api/cards") => json_response(api::cards_payload(engine)),
        ("GET", "/api/data/summary") => json_response(api::summary_payload(engine)),
        ("POST", "/api/card-win-rate") => {
            payload_response(api::card_win_rate_payload(engine, body))
        }
        ("POST", "/api/decks") => payload_response(api::decks_payload(engine, body)),
        ("POST", "/api/combo-losses") => {
            payload_response(api::combo_losses_payload(engine, body))
        }
        ("POST", "/api/conditional-wins") => {
            payload_response(api::conditional_wins_payload(engine, body))
        }
        ("POST", "/api/combo-wins") => payload_response(api::combo_wins_payload(engine, body)),
        _ => error_response(404, "Not Found", "Route not found"),
    }
}

fn json_response(result: Result<String, serde_json::Error>) -> HttpResponse {
    match result {
        Ok(payload) => HttpResponse {
            status_code: 200,
            status_text: "OK",
            content_type: "application/json",
            body: payload,
        },
        Err(err) => error_response(500, "Internal Server Error", &err.to_string()),
    }
}

fn payload_response(result: Result<String, PayloadError>) -> HttpResponse {
    match result {
        Ok(payload) => json_response(Ok(payload)),
        Err(PayloadError::Parse(err)) => {
            error_response(400, "Bad Request", &format!("Invalid request body: {err}"))
        }
        Err(PayloadError::Validation(validation)) => {
            validation_error_response(400, "Bad Request", validation)
        }
        Err(PayloadError::Stats(err)) => error_response(400, "Bad Request", &err.to_string()),
    }
}

fn validation_error_response(
    status_code: u16,
    status_text: &'static str,
    payload: api::ValidationErrorResponse,
) -> HttpResponse {
    let fallback =
        "{\n  \"status\": \"error\",\n  \"message\": \"Validation failed\"\n}".to_string();

    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: serde_json::to_string_pretty(&payload).unwrap_or(fallback),
    }
}

fn error_response(status_code: u16, status_text: &'static str, message: &str) -> HttpResponse {
    HttpResponse {
        status_code,
        status_text,
        content_type: "application/json",
        body: format!(
            "{{\n  \"status\": \"error\",\n  \"message\": {}\n}}",
            serde_json::to_string(message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
        ),
    }
}

fn index_html() -> String {
    r#"<!doctype html>
<html lang="en">
<head>
  <meta charset="utf-8" />
  <meta name="viewport" content="width=device-width,initial-scale=1" />
  <title>Royale Stats</title>
  <style>
    body { font-family: Arial, sans-serif; max-width: 900px; margin: 24px auto; padding: 0 12px; }
    h1 { margin-bottom: 4px; }
    .card { border: 1px solid #ddd; border-radius: 8px; padding: 14px; margin: 14px 0; }
    label { display:block; margin: 8px 0 4px; font-weight: 600; }
    input, select { width: 100%; padding: 8px; box-sizing: border-box; }
    input[type=range] { padding: 0; }
    button { margin-top: 12px; padding: 8px 14px; }
    pre { background: #111; color: #aef2ae; padding: 12px; overflow: auto; border-radius: 6px; min-height: 60px; white-space: pre-wrap; }
  </style>
</head>
<body>
  <h1>Battle Data Analysis</h1>
  <p id="summary">Loading dataset summary…</p>

  <div class="card">
    <strong>Card win and loss rate</strong>
    <label for="card">Card</label>
    <select id="card"></select>
    <div><button id="card-rate-btn">Calculate win/loss rate</button></div>
    <pre id="card-rate-out"></pre>
  </div>

  <div class="card">
    <strong>Decks above a win percentage</strong>
    <label for="threshold">Win percentage</label>
    <input id="threshold" type="number" min="0" max="100" step="0.5" value="50" />
    <div><button id="decks-btn">List decks</button></div>
    <pre id="decks-out"></pre>
  </div>

  <div class="card">
    <strong>Losses with a card combo</strong>
    <label for="combo">Combo (comma separated)</label>
    <input id="combo" value="Giant,Musketeer" />
    <div><button id="combo-btn">Count losses</button></div>
    <pre id="combo-out"></pre>
  </div>

  <div class="card">
    <strong>Wins under conditions (uses the selected card)</strong>
    <label for="trophy-diff">Winner trophy difference</label>
    <input id="trophy-diff" type="number" value="100" />
    <label for="towers">Towers destroyed by the loser</label>
    <input id="towers" type="number" value="2" />
    <div><button id="wins-btn">Count wins</button></div>
    <pre id="wins-out"></pre>
  </div>

  <div class="card">
    <strong>Combos above a win percentage</strong>
    <label for="combo-size">Combo size: <span id="combo-size-val">3</span></label>
    <input id="combo-size" type="range" min="1" max="8" value="3" />
    <label for="combo-threshold">Win percentage: <span id="combo-threshold-val">50</span></label>
    <input id="combo-threshold" type="range" min="0" max="100" step="0.5" value="50" />
    <div><button id="combo-wins-btn">List combos</button></div>
    <pre id="combo-wins-out"></pre>
  </div>

  <script>
    const $ = (id) => document.getElementById(id);

    async function post(path, payload) {
      const response = await fetch(path, {
        method: 'POST',
        headers: { 'Content-Type': 'application/json' },
        body: JSON.stringify(payload),
      });
      const json = await response.json();
      if (!response.ok) {
        const details = (json.errors || []).map(e => e.field + ': ' + e.messages.join(', ')).join('\n');
        throw new Error(json.message + (details ? '\n' + details : ''));
      }
      return json;
    }

    async function run(outId, render) {
      const out = $(outId);
      out.textContent = 'Loading…';
      try {
        out.textContent = await render();
      } catch (err) {
        out.textContent = 'Error: ' + err.message;
      }
    }

    fetch('/api/cards').then(r => r.json()).then(data => {
      const select = $('card');
      data.cards.forEach(card => {
        const option = document.createElement('option');
        option.value = card.name;
        option.textContent = card.name;
        select.appendChild(option);
      });
    });

    fetch('/api/data/summary').then(r => r.json()).then(json => {
      const d = json.data;
      $('summary').textContent = d.battle_count + ' battles, ' + d.card_count + ' cards (data as of ' + d.loaded_at + ')';
    }).catch(() => { $('summary').textContent = ''; });

    $('combo-size').addEventListener('input', () => { $('combo-size-val').textContent = $('combo-size').value; });
    $('combo-threshold').addEventListener('input', () => { $('combo-threshold-val').textContent = $('combo-threshold').value; });

    $('card-rate-btn').addEventListener('click', () => run('card-rate-out', async () => {
      const r = await post('/api/card-win-rate', { card: $('card').value });
      return 'Win rate: ' + r.win_rate + '%\nLoss rate: ' + r.loss_rate + '%';
    }));

    $('decks-btn').addEventListener('click', () => run('decks-out', async () => {
      const threshold = Number($('threshold').value);
      const r = await post('/api/decks', { threshold });
      if (!r.decks.length) return 'No deck found matching the criteria.';
      return 'Decks above ' + threshold + '%:\n' + r.decks
        .map(d => 'Deck: ' + d.deck.join(', ') + ', win percentage: ' + d.percentage.toFixed(2) + '%')
        .join('\n');
    }));

    $('combo-btn').addEventListener('click', () => run('combo-out', async () => {
      const r = await post('/api/combo-losses', { combo: $('combo').value });
      return 'Losses with combo [' + r.combo.join(', ') + ']: ' + r.losses;
    }));

    $('wins-btn').addEventListener('click', () => run('wins-out', async () => {
      const r = await post('/api/conditional-wins', {
        card: $('card').value,
        trophy_difference: Math.trunc(Number($('trophy-diff').value)),
        tower_destroyed: Math.trunc(Number($('towers').value)),
      });
      return 'Wins matching the conditions: ' + r.wins;
    }));

    $('combo-wins-btn').addEventListener('click', () => run('combo-wins-out', async () => {
      const r = await post('/api/combo-wins', {
        deck_size: Number($('combo-size').value),
        win_rate_threshold: Number($('combo-threshold').value),
      });
      if (!r.combos.length) return 'No combo found above the given win percentage.';
      return r.combos.map(c => 'Combo: ' + c.combo.join(', ') + ', win percentage: ' + c.win_rate + '%').join('\n');
    }));
  </script>
</body>
</html>
"#
    .to_string()
}
