//! GPIO / peripheral pin assignments for the brewrig main board.
//!
//! Single source of truth — the adapters reference this module rather than
//! hard-coding pin numbers. Change a pin here and it propagates everywhere.

// ---------------------------------------------------------------------------
// Relay / SSR outputs
// ---------------------------------------------------------------------------

/// RIMS recirculation pump relay.
pub const PUMP1_GPIO: i32 = 15;
/// Chill/whirlpool pump relay.
pub const PUMP2_GPIO: i32 = 16;
/// RIMS element SSR (active HIGH).
pub const HEAT1_GPIO: i32 = 17;
/// Boil element SSR (active HIGH).
pub const HEAT2_GPIO: i32 = 18;
/// RIMS element contactor — mechanical gate in series with the SSR.
pub const CONTACTOR1_GPIO: i32 = 8;
/// Boil element contactor.
pub const CONTACTOR2_GPIO: i32 = 9;

// ---------------------------------------------------------------------------
// MCP3008 SPI bus
// ---------------------------------------------------------------------------

pub const SPI_SCLK_GPIO: i32 = 12;
pub const SPI_MOSI_GPIO: i32 = 11;
pub const SPI_MISO_GPIO: i32 = 13;
pub const SPI_CS_GPIO: i32 = 10;

// ---------------------------------------------------------------------------
// Thermistor ADC channels (10-bit SPI converter)
// ---------------------------------------------------------------------------

/// RIMS tube outlet probe.
pub const THERM_RIMS_CH: u8 = 0;
/// Wort / chiller return probe.
pub const THERM_WORT_CH: u8 = 1;
/// Hot-liquor tank probe.
pub const THERM_HLT_CH: u8 = 2;
