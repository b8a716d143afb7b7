//! Project configuration data model.
//!
//! The entity graph persisted in a project file: board settings, physical
//! inputs (buttons, switches, rotary encoders), MAX7219 seven-segment display
//! modules, and the keyboard-output mappings attached to inputs.
//!
//! All types serialize to camelCase JSON with enum values as symbolic names,
//! so the on-disk format stays forward-readable across versions identified by
//! [`ProjectConfiguration::version`]. Structural invariants (pin uniqueness)
//! are not enforced here; see the `validation` module.

use crate::board::BoardKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version written into new projects.
pub const CURRENT_VERSION: &str = "1.0";

/// Stable identity of an input, generated at creation and never reused.
pub type InputId = Uuid;

/// Root object containing all project settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfiguration {
    pub version: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub board: BoardConfiguration,
    pub inputs: Vec<InputConfiguration>,
    pub displays: Vec<DisplayConfiguration>,
    pub output_mappings: Vec<OutputMapping>,
}

impl Default for ProjectConfiguration {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            version: CURRENT_VERSION.to_string(),
            name: "Untitled Configuration".to_string(),
            created_at: now,
            modified_at: now,
            board: BoardConfiguration::default(),
            inputs: Vec::new(),
            displays: Vec::new(),
            output_mappings: Vec::new(),
        }
    }
}

impl ProjectConfiguration {
    /// Every pin referenced by the configuration, in deterministic order:
    /// inputs first (primary, secondary, button per input), then each
    /// display's chip-select. Duplicates appear as often as they are claimed.
    pub fn used_pins(&self) -> Vec<u8> {
        let mut pins = Vec::new();
        for input in &self.inputs {
            pins.push(input.pin);
            pins.extend(input.pin2);
            pins.extend(input.button_pin);
        }
        for display in &self.displays {
            pins.push(display.cs_pin);
        }
        pins
    }

    /// Pins of the configured board not yet claimed by any input or display.
    /// This is the source set for pin pickers and for default pin selection
    /// when adding an input.
    pub fn free_pins(&self) -> Vec<u8> {
        let used = self.used_pins();
        self.board
            .board_kind
            .available_pins()
            .into_iter()
            .filter(|pin| !used.contains(pin))
            .collect()
    }

    /// Build a new input on the board's first free pin (encoders take the
    /// first two). Returns `None` when not enough pins remain.
    pub fn plan_input(&self, name: impl Into<String>, kind: InputKind) -> Option<InputConfiguration> {
        let free = self.free_pins();
        let mut input = InputConfiguration::new(name, kind, *free.first()?);
        if kind.is_encoder() {
            input.pin2 = Some(*free.get(1)?);
        }
        Some(input)
    }
}

/// Board-specific project settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardConfiguration {
    pub board_kind: BoardKind,
    pub preferred_port: Option<String>,
    pub baud_rate: u32,
}

impl Default for BoardConfiguration {
    fn default() -> Self {
        Self {
            board_kind: BoardKind::ProMicro,
            preferred_port: None,
            baud_rate: 115_200,
        }
    }
}

/// Kind of physical input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    MomentaryButton,
    /// KD2-22 style latching push button.
    LatchingButton,
    ToggleSwitch,
    /// EC11 style quadrature encoder, optionally with a push switch.
    RotaryEncoder,
}

impl InputKind {
    /// True for inputs that use a second quadrature line.
    pub fn is_encoder(&self) -> bool {
        matches!(self, InputKind::RotaryEncoder)
    }
}

/// One physical input and its wiring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConfiguration {
    pub id: InputId,
    pub name: String,
    pub kind: InputKind,
    /// Primary signal pin (CLK for encoders).
    pub pin: u8,
    /// Second quadrature line (DT), encoders only.
    pub pin2: Option<u8>,
    /// Encoder push-switch pin (SW), if wired.
    pub button_pin: Option<u8>,
    pub pullup_enabled: bool,
    pub debounce_ms: u32,
}

impl InputConfiguration {
    /// Create an input with a freshly allocated id and default electrical
    /// settings (internal pull-up on, 50 ms debounce).
    pub fn new(name: impl Into<String>, kind: InputKind, pin: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            kind,
            pin,
            pin2: None,
            button_pin: None,
            pullup_enabled: true,
            debounce_ms: 50,
        }
    }
}

/// One MAX7219 seven-segment display module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayConfiguration {
    pub id: Uuid,
    pub name: String,
    /// Chip-select pin addressing this module on the shared bus.
    pub cs_pin: u8,
    pub num_digits: u8,
    /// Intensity register value, 0-15.
    pub brightness: u8,
    pub leading_zeros: bool,
    /// Decimal point position from the right, if shown.
    pub decimal_position: Option<u8>,
    pub initial_value: i32,
    pub min_value: i32,
    pub max_value: i32,
    /// Encoders that drive this display's numeric value.
    pub encoder_mappings: Vec<EncoderDisplayMapping>,
}

impl DisplayConfiguration {
    /// Create a display with a freshly allocated id and default register
    /// settings (8 digits, mid brightness, 0..=99_999_999 range).
    pub fn new(name: impl Into<String>, cs_pin: u8) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            cs_pin,
            num_digits: 8,
            brightness: 8,
            leading_zeros: false,
            decimal_position: None,
            initial_value: 0,
            min_value: 0,
            max_value: 99_999_999,
            encoder_mappings: Vec::new(),
        }
    }
}

/// Ties an encoder to a display value with increment settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncoderDisplayMapping {
    pub encoder_id: InputId,
    /// Value step per detent: 1, 10, 100, 1000.
    pub increment: i32,
    pub clockwise_increases: bool,
}

impl EncoderDisplayMapping {
    /// Mapping with the default single-step, clockwise-increases behavior.
    pub fn new(encoder_id: InputId) -> Self {
        Self {
            encoder_id,
            increment: 1,
            clockwise_increases: true,
        }
    }
}

/// Keyboard output attached to one input. At most one mapping exists per
/// input; the store enforces this with upsert-by-id semantics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputMapping {
    pub input_id: InputId,
    /// Action for simple inputs; press action of the encoder switch.
    pub action: KeyboardAction,
    /// Encoder rotation actions, unused for simple inputs.
    pub clockwise_action: Option<KeyboardAction>,
    pub counter_clockwise_action: Option<KeyboardAction>,
}

impl OutputMapping {
    /// Mapping for a simple (non-encoder) input.
    pub fn simple(input_id: InputId, action: KeyboardAction) -> Self {
        Self {
            input_id,
            action,
            clockwise_action: None,
            counter_clockwise_action: None,
        }
    }
}

/// How a keyboard action is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionKind {
    SingleKey,
    KeyCombo,
    KeySequence,
    MediaKey,
}

/// A key press, combo, or sequence sent over the keyboard-emulation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyboardAction {
    pub kind: ActionKind,
    /// Key token, e.g. "A", "F1", "Space".
    pub key: String,
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
    /// Ordered key tokens for `ActionKind::KeySequence`.
    pub sequence: Option<Vec<String>>,
}

impl KeyboardAction {
    /// A plain single-key action with no modifiers.
    pub fn single(key: impl Into<String>) -> Self {
        Self {
            kind: ActionKind::SingleKey,
            key: key.into(),
            ctrl: false,
            alt: false,
            shift: false,
            meta: false,
            sequence: None,
        }
    }

    /// "Ctrl+Shift+F1" style rendering for list views and wiring guides.
    pub fn display_text(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl");
        }
        if self.alt {
            parts.push("Alt");
        }
        if self.shift {
            parts.push("Shift");
        }
        if self.meta {
            parts.push("Meta");
        }
        parts.push(&self.key);
        parts.join("+")
    }
}
