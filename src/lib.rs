//! Battle statistics over a recorded battle dataset and card catalog: card win rates,
//! popular winning decks, combo losses, conditional wins and sampled combos, served
//! as a small web dashboard or queried from the command line.

pub mod cli;
pub mod data;
pub mod server;
pub mod stats;
