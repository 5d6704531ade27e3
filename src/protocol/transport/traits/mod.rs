//! Collaborator traits: everything the bridge core needs from the board
//! (bus drivers, host link, persistence, file sink, pins, clock, timer).
pub mod board;
pub mod bus_driver;
pub mod host_link;
pub mod loop_timer;
pub mod storage;
