//! FS20 command table
//!
//! Every FS20 command is identified by a one-byte opcode. Opcodes below
//! `0x20` are sent alone; opcodes from `0x20` carry a trailing time byte:
//!
//! ```text
//! [OP]          single byte command (time byte sent as 0x00)
//! [OP] [TIME]   timed command, TIME encoded as in `crate::time`
//! ```
//!
//! The low five bits of an opcode form the *command group*. The receiver
//! reports only the group index plus a flag telling whether a time value was
//! present, so each of the 32 groups pairs a plain and a timed command.

use std::fmt;
use std::str::FromStr;

use crate::error::CodecError;

/// Number of command groups
pub const GROUP_COUNT: usize = 32;

/// Opcode bit marking commands that carry a time byte
pub const TIMED_FLAG: u8 = 0x20;

/// How a command relates to time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommandKind {
    /// Immediate action, no time involved
    Simple,
    /// Uses the device's internal timer
    SelfTiming,
    /// Requires a time byte
    Timed,
}

/// Static description of one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandInfo {
    pub command: Command,
    pub opcode: u8,
    pub name: &'static str,
    pub kind: CommandKind,
    pub description: &'static str,
}

macro_rules! command_table {
    ($($variant:ident = $opcode:literal, $name:literal, $kind:ident, $desc:literal;)*) => {
        /// Symbolic FS20 command
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        pub enum Command {
            $(
                #[doc = $desc]
                $variant,
            )*
        }

        /// All commands in opcode order
        pub static COMMANDS: [CommandInfo; Command::COUNT] = [
            $(
                CommandInfo {
                    command: Command::$variant,
                    opcode: $opcode,
                    name: $name,
                    kind: CommandKind::$kind,
                    description: $desc,
                },
            )*
        ];

        impl Command {
            /// Number of commands in the table
            pub const COUNT: usize = [$(stringify!($variant)),*].len();

            /// Row of this command in [`COMMANDS`]
            pub const fn index(self) -> usize {
                // variants carry no explicit discriminants, so they number rows in order
                self as usize
            }

            /// Static table entry
            pub fn info(self) -> &'static CommandInfo {
                &COMMANDS[self.index()]
            }

            /// Wire opcode
            pub const fn opcode(self) -> u8 {
                match self {
                    $(Command::$variant => $opcode,)*
                }
            }

            /// Upper snake case name, e.g. `ON_BRIGHTNESS_LEVEL_16`
            pub const fn name(self) -> &'static str {
                match self {
                    $(Command::$variant => $name,)*
                }
            }

            pub const fn kind(self) -> CommandKind {
                match self {
                    $(Command::$variant => CommandKind::$kind,)*
                }
            }

            /// Human readable description
            pub const fn description(self) -> &'static str {
                match self {
                    $(Command::$variant => $desc,)*
                }
            }
        }
    };
}

command_table! {
    Off = 0x00, "OFF", Simple, "Turn off.";
    OnBrightnessLevel1 = 0x01, "ON_BRIGHTNESS_LEVEL_1", Simple, "Turn on at brightness level 1 (6.25%).";
    OnBrightnessLevel2 = 0x02, "ON_BRIGHTNESS_LEVEL_2", Simple, "Turn on at brightness level 2 (12.5%).";
    OnBrightnessLevel3 = 0x03, "ON_BRIGHTNESS_LEVEL_3", Simple, "Turn on at brightness level 3 (18.75%).";
    OnBrightnessLevel4 = 0x04, "ON_BRIGHTNESS_LEVEL_4", Simple, "Turn on at brightness level 4 (25%).";
    OnBrightnessLevel5 = 0x05, "ON_BRIGHTNESS_LEVEL_5", Simple, "Turn on at brightness level 5 (31.25%).";
    OnBrightnessLevel6 = 0x06, "ON_BRIGHTNESS_LEVEL_6", Simple, "Turn on at brightness level 6 (37.5%).";
    OnBrightnessLevel7 = 0x07, "ON_BRIGHTNESS_LEVEL_7", Simple, "Turn on at brightness level 7 (43.75%).";
    OnBrightnessLevel8 = 0x08, "ON_BRIGHTNESS_LEVEL_8", Simple, "Turn on at brightness level 8 (50%).";
    OnBrightnessLevel9 = 0x09, "ON_BRIGHTNESS_LEVEL_9", Simple, "Turn on at brightness level 9 (56.25%).";
    OnBrightnessLevel10 = 0x0A, "ON_BRIGHTNESS_LEVEL_10", Simple, "Turn on at brightness level 10 (62.5%).";
    OnBrightnessLevel11 = 0x0B, "ON_BRIGHTNESS_LEVEL_11", Simple, "Turn on at brightness level 11 (68.75%).";
    OnBrightnessLevel12 = 0x0C, "ON_BRIGHTNESS_LEVEL_12", Simple, "Turn on at brightness level 12 (75%).";
    OnBrightnessLevel13 = 0x0D, "ON_BRIGHTNESS_LEVEL_13", Simple, "Turn on at brightness level 13 (81.25%).";
    OnBrightnessLevel14 = 0x0E, "ON_BRIGHTNESS_LEVEL_14", Simple, "Turn on at brightness level 14 (87.5%).";
    OnBrightnessLevel15 = 0x0F, "ON_BRIGHTNESS_LEVEL_15", Simple, "Turn on at brightness level 15 (93.75%).";
    OnBrightnessLevel16 = 0x10, "ON_BRIGHTNESS_LEVEL_16", Simple, "Turn on at brightness level 16 (100%).";
    On = 0x10, "ON", Simple, "Turn on (same opcode as brightness level 16).";
    OnLastBrightnessLevel = 0x11, "ON_LAST_BRIGHTNESS_LEVEL", Simple, "Turn on at the last brightness level.";
    Toggle = 0x12, "TOGGLE", Simple, "Toggle between off and the previous state.";
    DimUp = 0x13, "DIM_UP", Simple, "Dim one level up.";
    DimDown = 0x14, "DIM_DOWN", Simple, "Dim one level down.";
    Dim = 0x15, "DIM", Simple, "Dim stepwise up to maximum or down to minimum.";
    ChangeInternalTimer = 0x16, "CHANGE_INTERNAL_TIMER", Simple, "Start or stop programming the internal timer.";
    Educate = 0x17, "EDUCATE", Simple, "Teach an address to the device.";
    OffForInternalTimeThenLastBrightnessLevel = 0x18, "OFF_FOR_INTERNAL_TIME_THEN_LAST_BRIGHTNESS_LEVEL", SelfTiming, "Turn off for the internal time, then on at the last brightness level.";
    OnForInternalTimeThenOff = 0x19, "ON_FOR_INTERNAL_TIME_THEN_OFF", SelfTiming, "Turn on for the internal time, then off.";
    OnForInternalTimeLastBrightnessLevelThenOff = 0x1A, "ON_FOR_INTERNAL_TIME_LAST_BRIGHTNESS_LEVEL_THEN_OFF", SelfTiming, "Turn on at the last brightness level for the internal time, then off.";
    Reset = 0x1B, "RESET", Simple, "Reset to factory settings.";
    OnForInternalTimeThenPreviousState = 0x1E, "ON_FOR_INTERNAL_TIME_THEN_PREVIOUS_STATE", SelfTiming, "Turn on for the internal time, then return to the previous state.";
    OnForInternalTimeLastBrightnessLevelThenPreviousState = 0x1F, "ON_FOR_INTERNAL_TIME_LAST_BRIGHTNESS_LEVEL_THEN_PREVIOUS_STATE", SelfTiming, "Turn on at the last brightness level for the internal time, then return to the previous state.";
    DimOffInTime = 0x20, "DIM_OFF_IN_TIME", Timed, "Dim to 0% in the given time.";
    DimBrightnessLevel1InTime = 0x21, "DIM_BRIGHTNESS_LEVEL_1_IN_TIME", Timed, "Dim to brightness level 1 (6.25%) in the given time.";
    DimBrightnessLevel2InTime = 0x22, "DIM_BRIGHTNESS_LEVEL_2_IN_TIME", Timed, "Dim to brightness level 2 (12.5%) in the given time.";
    DimBrightnessLevel3InTime = 0x23, "DIM_BRIGHTNESS_LEVEL_3_IN_TIME", Timed, "Dim to brightness level 3 (18.75%) in the given time.";
    DimBrightnessLevel4InTime = 0x24, "DIM_BRIGHTNESS_LEVEL_4_IN_TIME", Timed, "Dim to brightness level 4 (25%) in the given time.";
    DimBrightnessLevel5InTime = 0x25, "DIM_BRIGHTNESS_LEVEL_5_IN_TIME", Timed, "Dim to brightness level 5 (31.25%) in the given time.";
    DimBrightnessLevel6InTime = 0x26, "DIM_BRIGHTNESS_LEVEL_6_IN_TIME", Timed, "Dim to brightness level 6 (37.5%) in the given time.";
    DimBrightnessLevel7InTime = 0x27, "DIM_BRIGHTNESS_LEVEL_7_IN_TIME", Timed, "Dim to brightness level 7 (43.75%) in the given time.";
    DimBrightnessLevel8InTime = 0x28, "DIM_BRIGHTNESS_LEVEL_8_IN_TIME", Timed, "Dim to brightness level 8 (50%) in the given time.";
    DimBrightnessLevel9InTime = 0x29, "DIM_BRIGHTNESS_LEVEL_9_IN_TIME", Timed, "Dim to brightness level 9 (56.25%) in the given time.";
    DimBrightnessLevel10InTime = 0x2A, "DIM_BRIGHTNESS_LEVEL_10_IN_TIME", Timed, "Dim to brightness level 10 (62.5%) in the given time.";
    DimBrightnessLevel11InTime = 0x2B, "DIM_BRIGHTNESS_LEVEL_11_IN_TIME", Timed, "Dim to brightness level 11 (68.75%) in the given time.";
    DimBrightnessLevel12InTime = 0x2C, "DIM_BRIGHTNESS_LEVEL_12_IN_TIME", Timed, "Dim to brightness level 12 (75%) in the given time.";
    DimBrightnessLevel13InTime = 0x2D, "DIM_BRIGHTNESS_LEVEL_13_IN_TIME", Timed, "Dim to brightness level 13 (81.25%) in the given time.";
    DimBrightnessLevel14InTime = 0x2E, "DIM_BRIGHTNESS_LEVEL_14_IN_TIME", Timed, "Dim to brightness level 14 (87.5%) in the given time.";
    DimBrightnessLevel15InTime = 0x2F, "DIM_BRIGHTNESS_LEVEL_15_IN_TIME", Timed, "Dim to brightness level 15 (93.75%) in the given time.";
    DimBrightnessLevel16InTime = 0x30, "DIM_BRIGHTNESS_LEVEL_16_IN_TIME", Timed, "Dim to brightness level 16 (100%) in the given time.";
    DimLastBrightnessLevelInTime = 0x31, "DIM_LAST_BRIGHTNESS_LEVEL_IN_TIME", Timed, "Dim up or down to the last brightness level in the given time.";
    DimLastBrightnessLevelThenOffInTime = 0x32, "DIM_LAST_BRIGHTNESS_LEVEL_THEN_OFF_IN_TIME", Timed, "Dim to the last brightness level, then off after the given time.";
    DimUpThenOffInTime = 0x33, "DIM_UP_THEN_OFF_IN_TIME", Timed, "Dim one level up, then off after the given time.";
    DimDownThenOffInTime = 0x34, "DIM_DOWN_THEN_OFF_IN_TIME", Timed, "Dim one level down, then off after the given time.";
    DimThenOffInTime = 0x35, "DIM_THEN_OFF_IN_TIME", Timed, "Dim one level up or down, then off after the given time.";
    SetInternalTimer = 0x36, "SET_INTERNAL_TIMER", Timed, "Set the internal timer used by self-timing commands.";
    OffForTimeThenLastBrightnessLevel = 0x38, "OFF_FOR_TIME_THEN_LAST_BRIGHTNESS_LEVEL", Timed, "Turn off for the given time, then on at the last brightness level.";
    OnForTimeThenOff = 0x39, "ON_FOR_TIME_THEN_OFF", Timed, "Turn on (100%) for the given time, then off.";
    OnForTimeLastBrightnessLevelThenOff = 0x3A, "ON_FOR_TIME_LAST_BRIGHTNESS_LEVEL_THEN_OFF", Timed, "Turn on at the last brightness level for the given time, then off.";
    SetInternalTimerDimUp = 0x3C, "SET_INTERNAL_TIMER_DIM_UP", Timed, "Set the internal timer for dimming up.";
    SetInternalTimerDimDown = 0x3D, "SET_INTERNAL_TIMER_DIM_DOWN", Timed, "Set the internal timer for dimming down.";
    OnForTimeThenPreviousState = 0x3E, "ON_FOR_TIME_THEN_PREVIOUS_STATE", Timed, "Turn on (100%) for the given time, then return to the previous state.";
    OnForTimeLastBrightnessLevelThenPreviousState = 0x3F, "ON_FOR_TIME_LAST_BRIGHTNESS_LEVEL_THEN_PREVIOUS_STATE", Timed, "Turn on at the last brightness level for the given time, then return to the previous state.";
}

/// Plain and timed command sharing one group index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandGroup {
    pub plain: Option<Command>,
    pub timed: Option<Command>,
}

impl CommandGroup {
    const fn new(plain: Option<Command>, timed: Option<Command>) -> Self {
        Self { plain, timed }
    }

    /// Select one of the two variants
    pub const fn variant(&self, timed: bool) -> Option<Command> {
        if timed {
            self.timed
        } else {
            self.plain
        }
    }
}

use Command::*;

/// Group table indexed by the low five opcode bits
pub static GROUPS: [CommandGroup; GROUP_COUNT] = [
    CommandGroup::new(Some(Off), Some(DimOffInTime)),
    CommandGroup::new(Some(OnBrightnessLevel1), Some(DimBrightnessLevel1InTime)),
    CommandGroup::new(Some(OnBrightnessLevel2), Some(DimBrightnessLevel2InTime)),
    CommandGroup::new(Some(OnBrightnessLevel3), Some(DimBrightnessLevel3InTime)),
    CommandGroup::new(Some(OnBrightnessLevel4), Some(DimBrightnessLevel4InTime)),
    CommandGroup::new(Some(OnBrightnessLevel5), Some(DimBrightnessLevel5InTime)),
    CommandGroup::new(Some(OnBrightnessLevel6), Some(DimBrightnessLevel6InTime)),
    CommandGroup::new(Some(OnBrightnessLevel7), Some(DimBrightnessLevel7InTime)),
    CommandGroup::new(Some(OnBrightnessLevel8), Some(DimBrightnessLevel8InTime)),
    CommandGroup::new(Some(OnBrightnessLevel9), Some(DimBrightnessLevel9InTime)),
    CommandGroup::new(Some(OnBrightnessLevel10), Some(DimBrightnessLevel10InTime)),
    CommandGroup::new(Some(OnBrightnessLevel11), Some(DimBrightnessLevel11InTime)),
    CommandGroup::new(Some(OnBrightnessLevel12), Some(DimBrightnessLevel12InTime)),
    CommandGroup::new(Some(OnBrightnessLevel13), Some(DimBrightnessLevel13InTime)),
    CommandGroup::new(Some(OnBrightnessLevel14), Some(DimBrightnessLevel14InTime)),
    CommandGroup::new(Some(OnBrightnessLevel15), Some(DimBrightnessLevel15InTime)),
    CommandGroup::new(Some(OnBrightnessLevel16), Some(DimBrightnessLevel16InTime)),
    CommandGroup::new(Some(OnLastBrightnessLevel), Some(DimLastBrightnessLevelInTime)),
    CommandGroup::new(Some(Toggle), Some(DimLastBrightnessLevelThenOffInTime)),
    CommandGroup::new(Some(DimUp), Some(DimUpThenOffInTime)),
    CommandGroup::new(Some(DimDown), Some(DimDownThenOffInTime)),
    CommandGroup::new(Some(Dim), Some(DimThenOffInTime)),
    CommandGroup::new(Some(ChangeInternalTimer), Some(SetInternalTimer)),
    CommandGroup::new(Some(Educate), None),
    CommandGroup::new(
        Some(OffForInternalTimeThenLastBrightnessLevel),
        Some(OffForTimeThenLastBrightnessLevel),
    ),
    CommandGroup::new(Some(OnForInternalTimeThenOff), Some(OnForTimeThenOff)),
    CommandGroup::new(
        Some(OnForInternalTimeLastBrightnessLevelThenOff),
        Some(OnForTimeLastBrightnessLevelThenOff),
    ),
    CommandGroup::new(Some(Reset), None),
    CommandGroup::new(None, Some(SetInternalTimerDimUp)),
    CommandGroup::new(None, Some(SetInternalTimerDimDown)),
    CommandGroup::new(
        Some(OnForInternalTimeThenPreviousState),
        Some(OnForTimeThenPreviousState),
    ),
    CommandGroup::new(
        Some(OnForInternalTimeLastBrightnessLevelThenPreviousState),
        Some(OnForTimeLastBrightnessLevelThenPreviousState),
    ),
];

/// Look up a command by name
pub fn opcode_for(name: &str) -> Result<Command, CodecError> {
    name.parse()
}

/// Look up the plain or timed command of a group
pub fn lookup_group(index: u8, timed: bool) -> Result<Command, CodecError> {
    GROUPS
        .get(usize::from(index))
        .and_then(|group| group.variant(timed))
        .ok_or(CodecError::UnknownCommandGroup { index, timed })
}

impl Command {
    /// Index of this command's group
    pub const fn group(self) -> u8 {
        self.opcode() & 0x1F
    }

    /// Whether the command is followed by a time byte on the wire
    pub const fn takes_time(self) -> bool {
        self.opcode() & TIMED_FLAG != 0
    }

    /// Iterate over every command
    pub fn all() -> impl Iterator<Item = Command> {
        COMMANDS.iter().map(|info| info.command)
    }
}

impl TryFrom<u8> for Command {
    type Error = CodecError;

    /// Resolve an opcode. `0x10` yields `OnBrightnessLevel16`.
    fn try_from(opcode: u8) -> Result<Self, Self::Error> {
        if opcode >= TIMED_FLAG << 1 {
            return Err(CodecError::InvalidCommand(format!(
                "opcode 0x{:02X}",
                opcode
            )));
        }
        lookup_group(opcode & 0x1F, opcode & TIMED_FLAG != 0)
            .map_err(|_| CodecError::InvalidCommand(format!("opcode 0x{:02X}", opcode)))
    }
}

impl FromStr for Command {
    type Err = CodecError;

    /// Names are matched case-insensitively, so `on` and `ON` are equivalent.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COMMANDS
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(s))
            .map(|info| info.command)
            .ok_or_else(|| CodecError::UnknownCommand(s.to_string()))
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_for() {
        assert_eq!(opcode_for("ON").unwrap().opcode(), 0x10);
        assert_eq!(opcode_for("dim_up").unwrap(), Command::DimUp);
        assert_eq!(opcode_for("DIM_BRIGHTNESS_LEVEL_4_IN_TIME").unwrap().opcode(), 0x24);
        assert_eq!(
            opcode_for("FOOBAR"),
            Err(CodecError::UnknownCommand("FOOBAR".to_string()))
        );
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Command::Toggle.kind(), CommandKind::Simple);
        assert_eq!(Command::OnForInternalTimeThenOff.kind(), CommandKind::SelfTiming);
        assert_eq!(Command::OnForTimeThenOff.kind(), CommandKind::Timed);
        for info in &COMMANDS {
            assert_eq!(
                info.kind == CommandKind::Timed,
                info.command.takes_time(),
                "{}",
                info.name
            );
        }
    }

    #[test]
    fn test_table_consistency() {
        for info in &COMMANDS {
            assert_eq!(info.command.opcode(), info.opcode);
            assert_eq!(info.command.name(), info.name);
            assert_eq!(info.command.info(), info);
            assert_eq!(info.name.parse::<Command>().unwrap(), info.command);
        }
        assert_eq!(Command::all().count(), COMMANDS.len());
    }

    #[test]
    fn test_info_row_matches_variant() {
        for (row, info) in COMMANDS.iter().enumerate() {
            assert_eq!(info.command.index(), row);
        }
        assert_eq!(Command::Off.info().opcode, 0x00);
        assert_eq!(Command::On.info().name, "ON");
        assert_eq!(Command::OnBrightnessLevel16.info().name, "ON_BRIGHTNESS_LEVEL_16");
        assert_eq!(
            Command::OnForTimeLastBrightnessLevelThenPreviousState.info().opcode,
            0x3F
        );
    }

    #[test]
    fn test_groups_match_opcodes() {
        for (index, group) in GROUPS.iter().enumerate() {
            if let Some(cmd) = group.plain {
                assert_eq!(usize::from(cmd.opcode()), index);
            }
            if let Some(cmd) = group.timed {
                assert_eq!(usize::from(cmd.opcode()), index + 0x20);
            }
        }
        // every command except the ON alias has a group slot
        for cmd in Command::all().filter(|c| *c != Command::On) {
            assert_eq!(lookup_group(cmd.group(), cmd.takes_time()).unwrap(), cmd);
        }
    }

    #[test]
    fn test_lookup_group() {
        assert_eq!(lookup_group(16, false).unwrap(), Command::OnBrightnessLevel16);
        assert_eq!(lookup_group(4, true).unwrap(), Command::DimBrightnessLevel4InTime);
        assert_eq!(
            lookup_group(28, false),
            Err(CodecError::UnknownCommandGroup { index: 28, timed: false })
        );
        assert!(lookup_group(29, false).is_err());
        assert!(lookup_group(23, true).is_err());
        assert!(lookup_group(27, true).is_err());
        assert!(lookup_group(32, false).is_err());
    }

    #[test]
    fn test_try_from_opcode() {
        assert_eq!(Command::try_from(0x10).unwrap(), Command::OnBrightnessLevel16);
        assert_eq!(Command::try_from(0x3F).unwrap(), Command::OnForTimeLastBrightnessLevelThenPreviousState);
        assert!(matches!(Command::try_from(0x1C), Err(CodecError::InvalidCommand(_))));
        assert!(matches!(Command::try_from(0x37), Err(CodecError::InvalidCommand(_))));
        assert!(matches!(Command::try_from(0x40), Err(CodecError::InvalidCommand(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Command::OnBrightnessLevel16.to_string(), "ON_BRIGHTNESS_LEVEL_16");
    }
}
