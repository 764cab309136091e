pub mod auctions;
pub mod checkpoints;
pub mod custody;
pub mod ledger;
