//! Core constants for the Warden access-control engine.
//!
//! Every timing value in the engine is expressed in milliseconds of the
//! system tick, which advances once per millisecond from interrupt context.
//! These constants are the defaults behind the configurable timing structs
//! (`SecurityTiming`, `DebounceConfig`, `PinEntryConfig`,
//! `CardReaderConfig`), so a deployment can override them without touching
//! the state machines.
//!
//! # Usage
//!
//! ```
//! use warden_core::constants::*;
//!
//! // A sweep visits every keypad row once, one row per tick.
//! assert_eq!(KEYPAD_ROWS as u32 * TICK_PERIOD_MS, 4);
//!
//! // The brute-force limit is shared between keypad and card reader.
//! assert_eq!(BRUTE_FORCE_LIMIT, 3);
//! ```

// ============================================================================
// Tick Service
// ============================================================================

/// Period of the system tick in milliseconds.
///
/// The interrupt context runs exactly one unit of work per tick: it advances
/// the counter, samples one keypad row and wakes the main loop.
pub const TICK_PERIOD_MS: u32 = 1;

// ============================================================================
// Security State Machine Timing
// ============================================================================

/// Sensor stabilization time after power-up.
///
/// The motion sensor and the card reader can report spurious signals right
/// after boot. The security state machine performs no transitions until this
/// much time has passed since the tick counter's origin.
///
/// # Value: 2000ms
pub const BOOT_SETTLE_MS: u32 = 2000;

/// Grace window after motion is detected.
///
/// A valid credential presented inside this window disarms the system
/// silently; otherwise the alarm is triggered.
///
/// # Value: 5000ms
pub const ENTRY_DELAY_MS: u32 = 5000;

/// Time the door remains unlocked after a successful authorization.
///
/// # Value: 5000ms
pub const DISARM_WINDOW_MS: u32 = 5000;

/// Settle time between the door-close request and the start of the exit delay.
///
/// # Value: 1000ms
pub const AUTO_LOCK_DELAY_MS: u32 = 1000;

/// Grace period for the operator to leave before monitoring resumes.
///
/// # Value: 10000ms
pub const EXIT_DELAY_MS: u32 = 10000;

/// Indicator toggle cadence during the exit delay.
pub const EXIT_BLINK_MS: u32 = 1000;

/// Alarm tone and indicator toggle cadence while triggered.
pub const ALARM_BLINK_MS: u32 = 500;

/// Duration of the brute-force lockout penalty.
///
/// # Value: 10000ms
pub const LOCKOUT_MS: u32 = 10000;

/// Siren alternation cadence during lockout.
pub const LOCKOUT_SIREN_MS: u32 = 100;

/// Number of invalid credentials that forces a lockout.
///
/// Keypad and card failures share a single counter, so mixing modalities does
/// not buy an attacker extra attempts.
///
/// # Examples
///
/// ```
/// use warden_core::constants::BRUTE_FORCE_LIMIT;
///
/// let failed_attempts: u8 = 3;
/// assert!(failed_attempts >= BRUTE_FORCE_LIMIT);
/// ```
pub const BRUTE_FORCE_LIMIT: u8 = 3;

// ============================================================================
// Feedback
// ============================================================================

/// Alarm intensity (percent duty) when the alarm first sounds.
pub const ALARM_INTENSITY_INITIAL: u8 = 10;

/// Intensity increase applied for each invalid credential while triggered.
pub const ALARM_INTENSITY_STEP: u8 = 10;

/// Upper bound for alarm intensity, also used for the lockout siren.
pub const ALARM_INTENSITY_MAX: u8 = 50;

/// Alternating alarm pitches while triggered.
pub const ALARM_TONE_HIGH: u16 = 1000;
pub const ALARM_TONE_LOW: u16 = 500;

/// Alternating siren pitches while locked out.
pub const SIREN_TONE_HIGH: u16 = 2500;
pub const SIREN_TONE_LOW: u16 = 1500;

/// Pitch started the moment a lockout engages.
pub const LOCKOUT_TONE: u16 = 2000;

/// Chirp played when a credential is accepted.
pub const SUCCESS_CHIRP_MS: u16 = 200;

/// Chirp played when a credential is rejected during the entry delay.
pub const ERROR_CHIRP_MS: u16 = 800;

/// Tactile chirp played for every key consumed by PIN entry.
pub const KEY_CHIRP_MS: u16 = 30;

// ============================================================================
// Keypad
// ============================================================================

/// Number of matrix rows; one row is sampled per tick.
pub const KEYPAD_ROWS: usize = 4;

/// Number of matrix columns read back per row.
pub const KEYPAD_COLUMNS: usize = 4;

/// Character map of the 4x4 membrane keypad, indexed by `[row][column]`.
pub const KEY_MAP: [[char; KEYPAD_COLUMNS]; KEYPAD_ROWS] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Time a sampled key must stay stable before it is accepted.
///
/// With a 1ms tick and four rows a sweep takes 4ms, so 80ms corresponds to a
/// threshold of 20 sweeps. The keypad latches once the stability counter
/// exceeds that threshold.
pub const DEBOUNCE_STABLE_MS: u32 = 80;

/// Key that clears the PIN buffer and wakes the system into the entry delay.
pub const SENTINEL_KEY: char = '#';

/// Exact number of keys in a door PIN.
pub const PIN_LENGTH: usize = 4;

/// Partial PIN entries are discarded after this much inactivity.
pub const PIN_ENTRY_TIMEOUT_MS: u32 = 5000;

// ============================================================================
// Card Reader
// ============================================================================

/// Interval between card-read attempts while the reader is idle.
pub const CARD_POLL_INTERVAL_MS: u32 = 100;

/// Time allowed for the reader to answer a request or anti-collision command.
pub const CARD_RESPONSE_TIMEOUT_MS: u32 = 25;

/// Inactivity window after which the last-seen card counts as new again.
pub const CARD_INACTIVITY_MS: u32 = 500;

/// Length of a single-size card identifier in bytes.
pub const CARD_UID_LENGTH: usize = 4;

// ============================================================================
// Credential Storage
// ============================================================================

/// Capacity of the authorized card set.
pub const MAX_AUTHORIZED_CARDS: usize = 50;

/// Maximum admin password length (characters).
pub const MAX_ADMIN_PASSWORD_LENGTH: usize = 9;

/// Door PIN installed on first boot and after a factory reset.
pub const DEFAULT_DOOR_PIN: &str = "1234";

/// Admin password installed on first boot and after a factory reset.
pub const DEFAULT_ADMIN_PASSWORD: &str = "123456";
