//! Mission scripting engine for Armada.
//!
//! Decides, tick by tick, whether scripted mission events fire, and
//! executes their effects: messages, spacecraft commands, damage and
//! repair, team changes, and the mission's win/lose outcome.

pub mod action;
pub mod battle;
pub mod clock;
pub mod condition;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod error;
pub mod event;
pub mod hud;
pub mod mission;
pub mod objective;
pub mod snapshot;
pub mod store;
pub mod strings;
pub mod subject;
pub mod timer;
pub mod trigger;
pub mod types;
