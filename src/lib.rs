//! Subprocess supervisor - run a child process, stream its output line by
//! line, enforce a timeout, and allow it to be killed.

pub mod config;
pub mod display;
pub mod fileinfo;
pub mod subprocess;
