//! Bit-flag views over the raw flag bytes stored in HIRC structures.
//!
//! Every flag byte keeps its raw `u8` in the owning struct. Each struct gets its own
//! flag enum, so a flag from one set can never be applied to another struct's byte.

pub trait FlagSet: Copy {
    fn bit(self) -> u8;

    fn mask(self) -> u8 {
        1 << self.bit()
    }
}

pub fn has_flag<F: FlagSet>(byte: u8, flag: F) -> bool {
    byte & flag.mask() != 0
}

pub fn with_flag<F: FlagSet>(byte: u8, flag: F, on: bool) -> u8 {
    if on {
        byte | flag.mask()
    } else {
        byte & !flag.mask()
    }
}

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident { $($variant:ident = $bit:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum $name {
            $($variant),+
        }

        impl FlagSet for $name {
            fn bit(self) -> u8 {
                match self {
                    $($name::$variant => $bit),+
                }
            }
        }
    };
}

flag_set!(
    /// `NodeBaseParams::flags`
    NodeBaseFlags {
        PriorityOverrideParent = 0,
        PriorityApplyDistFactor = 1,
        OverrideMidiEventsBehavior = 2,
        OverrideMidiNoteTracking = 3,
        EnableMidiNoteTracking = 4,
        MidiBreakLoopOnNoteOff = 5,
    }
);

flag_set!(
    /// `PositioningParams::bits`
    PositioningFlags {
        OverrideParent = 0,
        ListenerRelativeRouting = 1,
        Positioning3dAvailable = 3,
    }
);

flag_set!(
    /// `PositioningParams::bits_3d`. The low two bits hold the position type.
    Positioning3dFlags {
        EnableAttenuation = 3,
        HoldEmitterPosAndOrient = 4,
        HoldListenerOrient = 5,
        EnableDiffraction = 6,
    }
);

flag_set!(
    /// `AuxParams::flags`
    AuxFlags {
        OverrideGameAuxSends = 0,
        UseGameAuxSends = 1,
        OverrideUserAuxSends = 2,
        HasAux = 3,
        OverrideReflectionsAuxBus = 4,
    }
);

flag_set!(
    /// `AdvSettingsParams::flags`
    AdvSettingsFlags {
        KillNewest = 0,
        UseVirtualBehavior = 1,
        IgnoreParentMaxNumInst = 3,
        VVoicesOptOverrideParent = 4,
    }
);

flag_set!(
    /// `AdvSettingsParams::flags2`
    AdvSettingsFlags2 {
        OverrideHdrEnvelope = 0,
        OverrideAnalysis = 1,
        NormalizeLoudness = 2,
        EnableEnvelope = 3,
    }
);

flag_set!(
    /// `BusValues::flags1`
    BusFlags1 {
        KillNewest = 0,
        UseVirtualBehavior = 1,
        IgnoreParentMaxNumInst = 2,
        BackgroundMusic = 3,
    }
);

flag_set!(
    /// `BusValues::flags2`
    BusFlags2 {
        HdrBus = 0,
        HdrReleaseModeExponential = 1,
    }
);

flag_set!(
    /// `BusValues::flags3`
    BusFlags3 {
        MixerIsShareSet = 0,
    }
);

flag_set!(
    /// `RanSeqValues::flags`
    RanSeqFlags {
        UsingWeight = 0,
        ResetPlayListAtEachPlay = 1,
        RestartBackward = 2,
        Continuous = 3,
        Global = 4,
    }
);

flag_set!(
    /// `SwitchNodeParams::flags`
    SwitchNodeFlags {
        FirstOnly = 0,
        ContinuePlayback = 1,
    }
);

flag_set!(
    /// `MusicNodeParams::flags`
    MusicNodeFlags {
        OverrideParentMidiTempo = 1,
        OverrideParentMidiTarget = 2,
        MidiTargetTypeBus = 3,
    }
);

flag_set!(
    /// `MusicTrackValues::flags`
    MusicTrackFlags {
        OverrideParentMidiTempo = 1,
        OverrideParentMidiTarget = 2,
        MidiTargetTypeBus = 3,
    }
);

flag_set!(
    /// `MediaInformation::source_flags`
    MediaFlags {
        LanguageSpecific = 0,
        Prefetch = 1,
        NonCachable = 3,
        HasSource = 7,
    }
);

/// Position type stored in the low two bits of `bits_3d`.
pub fn position_type(bits_3d: u8) -> u8 {
    bits_3d & 0x03
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_toggle_only_their_bit() {
        let byte = with_flag(0, AuxFlags::HasAux, true);
        assert_eq!(byte, 0x08);
        assert!(has_flag(byte, AuxFlags::HasAux));
        assert!(!has_flag(byte, AuxFlags::UseGameAuxSends));

        let byte = with_flag(0xFF, AuxFlags::HasAux, false);
        assert_eq!(byte, 0xF7);
    }

    #[test]
    fn positioning_3d_bit_is_0x08() {
        assert!(has_flag(0x08, PositioningFlags::Positioning3dAvailable));
        assert!(!has_flag(0x07, PositioningFlags::Positioning3dAvailable));
        assert_eq!(position_type(0x01), 1);
        assert_eq!(position_type(0xFE), 2);
    }
}
