//! Integration tests for the BrewService → Recipe → Step → hardware
//! pipeline.
//!
//! These run on the host and verify the full chain from an incoming
//! command down to physical output levels, with simulated time and mock
//! hardware.

mod brew_flow_tests;
mod mock_hw;
mod safety_tests;
