use crate::{
    Result,
    constants::{
        DEFAULT_ADMIN_PASSWORD, DEFAULT_DOOR_PIN, KEY_MAP, MAX_ADMIN_PASSWORD_LENGTH,
        MAX_AUTHORIZED_CARDS, PIN_LENGTH, SENTINEL_KEY,
    },
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use subtle::ConstantTimeEq;

/// One character of the 4x4 keypad alphabet (`0-9`, `A-D`, `*`, `#`).
///
/// Stored as its ASCII byte so it fits the single-byte event slot shared
/// with the interrupt context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Key(u8);

impl Key {
    /// Create a key with validation against the keypad alphabet.
    ///
    /// # Errors
    /// Returns `Error::InvalidKey` if the character is not on the keypad.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::Key;
    ///
    /// assert_eq!(Key::new('7').unwrap().as_char(), '7');
    /// assert!(Key::new('#').unwrap().is_sentinel());
    /// assert!(Key::new('E').is_err());
    /// ```
    pub fn new(c: char) -> Result<Self> {
        if KEY_MAP.iter().flatten().any(|&k| k == c) {
            Ok(Key(c as u8))
        } else {
            Err(Error::InvalidKey(c))
        }
    }

    /// Rebuild a key from its raw byte, `None` for 0 or unknown bytes.
    #[must_use]
    pub fn from_byte(byte: u8) -> Option<Self> {
        if byte == 0 {
            return None;
        }
        Key::new(byte as char).ok()
    }

    #[must_use]
    pub fn as_byte(self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn as_char(self) -> char {
        self.0 as char
    }

    /// Whether this is the buffer-clearing sentinel key.
    #[must_use]
    pub fn is_sentinel(self) -> bool {
        self.as_char() == SENTINEL_KEY
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Door PIN: exactly four non-sentinel keypad characters.
///
/// # Security
/// Comparison is constant-time and the `Debug` output is redacted, so a PIN
/// never ends up in logs.
#[derive(Clone, Eq)]
pub struct Pin([Key; PIN_LENGTH]);

impl Pin {
    /// Create a PIN with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPin` if the length is not exactly four, a
    /// character is outside the keypad alphabet, or the sentinel key is used
    /// (it can never be typed as part of a PIN).
    pub fn new(pin: &str) -> Result<Self> {
        let chars: Vec<char> = pin.chars().collect();
        if chars.len() != PIN_LENGTH {
            return Err(Error::InvalidPin(format!(
                "PIN must be exactly {PIN_LENGTH} keys, got {}",
                chars.len()
            )));
        }

        let mut keys = [Key(0); PIN_LENGTH];
        for (slot, c) in keys.iter_mut().zip(chars) {
            let key = Key::new(c)
                .map_err(|_| Error::InvalidPin("use 0-9, A-D and *".to_string()))?;
            if key.is_sentinel() {
                return Err(Error::InvalidPin(format!(
                    "{SENTINEL_KEY} is reserved for clearing the entry"
                )));
            }
            *slot = key;
        }
        Ok(Pin(keys))
    }

    /// Constant-time comparison against a submitted key sequence.
    #[must_use]
    pub fn matches(&self, entered: &[Key]) -> bool {
        let stored: Vec<u8> = self.0.iter().map(|k| k.as_byte()).collect();
        let entered: Vec<u8> = entered.iter().map(|k| k.as_byte()).collect();
        stored.ct_eq(&entered).into()
    }

    /// The PIN as a string, for persistence only.
    #[must_use]
    pub fn expose(&self) -> String {
        self.0.iter().map(|k| k.as_char()).collect()
    }

    /// The keys in typing order, for driving a simulated keypad.
    #[must_use]
    pub fn keys(&self) -> &[Key] {
        &self.0
    }
}

impl PartialEq for Pin {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl fmt::Debug for Pin {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("Pin(****)")
    }
}

impl std::str::FromStr for Pin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Pin::new(s)
    }
}

/// Remote console password (1-9 characters, no whitespace).
#[derive(Clone, Eq)]
pub struct AdminPassword(String);

impl AdminPassword {
    /// Create an admin password with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidAdminPassword` if the password is empty, longer
    /// than nine characters or contains whitespace.
    pub fn new(password: &str) -> Result<Self> {
        let len = password.chars().count();
        if !(1..=MAX_ADMIN_PASSWORD_LENGTH).contains(&len) {
            return Err(Error::InvalidAdminPassword(format!(
                "must be 1-{MAX_ADMIN_PASSWORD_LENGTH} chars, got {len}"
            )));
        }
        if password.chars().any(char::is_whitespace) {
            return Err(Error::InvalidAdminPassword(
                "must not contain whitespace".to_string(),
            ));
        }
        Ok(AdminPassword(password.to_string()))
    }

    /// Constant-time comparison against a candidate password.
    #[must_use]
    pub fn verify(&self, candidate: &str) -> bool {
        self.0.as_bytes().ct_eq(candidate.as_bytes()).into()
    }

    /// The password as a string, for persistence only.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl PartialEq for AdminPassword {
    fn eq(&self, other: &Self) -> bool {
        self.verify(&other.0)
    }
}

impl fmt::Debug for AdminPassword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("AdminPassword(****)")
    }
}

/// Four-byte contactless card identifier.
///
/// Zero marks an empty slot in the authorized set, so a `CardUid` is never
/// zero and `Option<CardUid>` is the same size as a `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct CardUid(NonZeroU32);

impl CardUid {
    /// Create a card identifier, `None` for the empty-slot value 0.
    #[must_use]
    pub fn new(raw: u32) -> Option<Self> {
        NonZeroU32::new(raw).map(CardUid)
    }

    /// Pack the identifier bytes big-endian, as the reader returns them.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_core::CardUid;
    ///
    /// let uid = CardUid::from_bytes([0x11, 0x22, 0x33, 0x44]).unwrap();
    /// assert_eq!(uid.as_u32(), 0x1122_3344);
    /// assert_eq!(uid.to_string(), "11223344");
    /// assert!(CardUid::from_bytes([0; 4]).is_none());
    /// ```
    #[must_use]
    pub fn from_bytes(bytes: [u8; 4]) -> Option<Self> {
        CardUid::new(u32::from_be_bytes(bytes))
    }

    #[must_use]
    pub fn to_bytes(self) -> [u8; 4] {
        self.0.get().to_be_bytes()
    }

    #[must_use]
    pub fn as_u32(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for CardUid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:08X}", self.0.get())
    }
}

impl std::str::FromStr for CardUid {
    type Err = Error;

    /// Parse a hexadecimal identifier; embedded spaces and a `0x` prefix are
    /// accepted, so `"11 22 33 44"` and `"0x11223344"` are equivalent.
    fn from_str(s: &str) -> Result<Self> {
        let cleaned: String = s.chars().filter(|c| !c.is_whitespace()).collect();
        let digits = cleaned
            .strip_prefix("0x")
            .or_else(|| cleaned.strip_prefix("0X"))
            .unwrap_or(&cleaned);
        let raw = u32::from_str_radix(digits, 16)
            .map_err(|_| Error::InvalidCardUid(format!("not a 32-bit hex value: {s}")))?;
        CardUid::new(raw).ok_or_else(|| Error::InvalidCardUid("0 is not a card".to_string()))
    }
}

impl TryFrom<u32> for CardUid {
    type Error = Error;

    fn try_from(raw: u32) -> Result<Self> {
        CardUid::new(raw).ok_or_else(|| Error::InvalidCardUid("0 is not a card".to_string()))
    }
}

impl From<CardUid> for u32 {
    fn from(uid: CardUid) -> u32 {
        uid.as_u32()
    }
}

/// Alarm output intensity as a percentage duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlarmIntensity(u8);

impl AlarmIntensity {
    #[must_use]
    pub const fn new(percent: u8) -> Self {
        AlarmIntensity(percent)
    }

    #[must_use]
    pub const fn percent(self) -> u8 {
        self.0
    }

    /// Raise by `step`, never beyond `max`.
    #[must_use]
    pub fn raised(self, step: u8, max: u8) -> Self {
        AlarmIntensity(self.0.saturating_add(step).min(max))
    }
}

impl fmt::Display for AlarmIntensity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

/// Credential modality that produced an authorization outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Keypad,
    Card,
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Modality::Keypad => write!(f, "keypad"),
            Modality::Card => write!(f, "card"),
        }
    }
}

/// Shared credential configuration: door PIN, admin password and the
/// fixed-capacity set of authorized cards.
///
/// Slot order carries no meaning; empty slots are `None`. The credential
/// store owns the live instance and hands out references to it.
///
/// # Examples
///
/// ```
/// use warden_core::{CardUid, CredentialConfig, Key};
///
/// let mut config = CredentialConfig::default();
/// let uid = CardUid::new(0xDEAD_BEEF).unwrap();
///
/// assert!(!config.is_authorized(uid));
/// config.add_card(uid).unwrap();
/// assert!(config.is_authorized(uid));
///
/// let keys: Vec<Key> = "1234".chars().map(|c| Key::new(c).unwrap()).collect();
/// assert!(config.door_pin().matches(&keys));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialConfig {
    door_pin: Pin,
    admin_password: AdminPassword,
    cards: [Option<CardUid>; MAX_AUTHORIZED_CARDS],
}

impl CredentialConfig {
    /// Create a configuration with no authorized cards.
    #[must_use]
    pub fn new(door_pin: Pin, admin_password: AdminPassword) -> Self {
        Self {
            door_pin,
            admin_password,
            cards: [None; MAX_AUTHORIZED_CARDS],
        }
    }

    #[must_use]
    pub fn door_pin(&self) -> &Pin {
        &self.door_pin
    }

    pub fn set_door_pin(&mut self, pin: Pin) {
        self.door_pin = pin;
    }

    #[must_use]
    pub fn admin_password(&self) -> &AdminPassword {
        &self.admin_password
    }

    pub fn set_admin_password(&mut self, password: AdminPassword) {
        self.admin_password = password;
    }

    /// Linear scan of the authorized set.
    #[must_use]
    pub fn is_authorized(&self, uid: CardUid) -> bool {
        self.cards.iter().flatten().any(|&stored| stored == uid)
    }

    /// Store `uid` in the first empty slot and return the slot index.
    ///
    /// # Errors
    /// Returns `Error::DuplicateCard` if the card is already present and
    /// `Error::CardStoreFull` if every slot is taken.
    pub fn add_card(&mut self, uid: CardUid) -> Result<usize> {
        if self.is_authorized(uid) {
            return Err(Error::DuplicateCard(uid));
        }
        let (index, slot) = self
            .cards
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.is_none())
            .ok_or(Error::CardStoreFull {
                capacity: MAX_AUTHORIZED_CARDS,
            })?;
        *slot = Some(uid);
        Ok(index)
    }

    /// Clear every slot holding `uid`.
    ///
    /// # Errors
    /// Returns `Error::CardNotFound` if no slot matched.
    pub fn remove_card(&mut self, uid: CardUid) -> Result<()> {
        let mut found = false;
        for slot in self.cards.iter_mut().filter(|slot| **slot == Some(uid)) {
            *slot = None;
            found = true;
        }
        if found {
            Ok(())
        } else {
            Err(Error::CardNotFound(uid))
        }
    }

    /// Place `uid` in a specific slot, used when restoring persisted state.
    ///
    /// # Errors
    /// Returns `Error::Config` if the slot index is out of range.
    pub fn set_slot(&mut self, index: usize, uid: Option<CardUid>) -> Result<()> {
        let slot = self.cards.get_mut(index).ok_or_else(|| {
            Error::Config(format!(
                "card slot {index} out of range (capacity {MAX_AUTHORIZED_CARDS})"
            ))
        })?;
        *slot = uid;
        Ok(())
    }

    /// Occupied slots as `(index, uid)` pairs.
    pub fn cards(&self) -> impl Iterator<Item = (usize, CardUid)> + '_ {
        self.cards
            .iter()
            .enumerate()
            .filter_map(|(index, slot)| slot.map(|uid| (index, uid)))
    }

    #[must_use]
    pub fn card_count(&self) -> usize {
        self.cards.iter().flatten().count()
    }
}

impl Default for CredentialConfig {
    /// Factory configuration: PIN `1234`, admin password `123456`, no cards.
    fn default() -> Self {
        let digits = DEFAULT_DOOR_PIN.as_bytes();
        Self::new(
            Pin([Key(digits[0]), Key(digits[1]), Key(digits[2]), Key(digits[3])]),
            AdminPassword(DEFAULT_ADMIN_PASSWORD.to_string()),
        )
    }
}
