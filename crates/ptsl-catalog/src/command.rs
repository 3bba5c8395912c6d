//! Command identifiers.

use std::fmt;

macro_rules! command_ids {
    ($($name:ident = $code:literal,)*) => {
        /// Identifier of one remote operation.
        ///
        /// Codes are stable: new commands get new codes, existing codes are never reused.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[non_exhaustive]
        pub enum CommandId {
            $($name = $code,)*
        }

        impl CommandId {
            /// Every known identifier, in code order.
            pub const ALL: &'static [CommandId] = &[$(CommandId::$name,)*];

            pub fn from_code(code: u32) -> Option<Self> {
                match code {
                    $($code => Some(Self::$name),)*
                    _ => None,
                }
            }

            pub fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

command_ids! {
    CreateSession = 0,
    OpenSession = 1,
    Import = 2,
    GetTrackList = 3,
    SelectAllClipsOnTrack = 4,
    ExtendSelectionToTargetTracks = 5,
    TrimToSelection = 6,
    CreateFadesBasedOnPreset = 7,
    RenameTargetTrack = 8,
    ConsolidateClip = 9,
    ExportClipsAsFiles = 10,
    ExportSelectedTracksAsAAFOMF = 11,
    ExportMix = 12,
    Cut = 13,
    Copy = 14,
    Paste = 15,
    Clear = 16,
    RefreshTargetAudioFiles = 17,
    RefreshAllModifiedAudioFiles = 18,
    GetTaskStatus = 19,
    HostReadyCheck = 20,
    AuthorizeConnection = 21,
    GetFileLocation = 22,
    ClearSpecial = 23,
    CopySpecial = 24,
    CutSpecial = 25,
    PasteSpecial = 26,
    SaveSession = 27,
    CloseSession = 28,
    SaveSessionAs = 29,
    Spot = 30,
    ExportSessionInfoAsText = 31,
    GetDynamicProperties = 32,
    GetPTSLVersion = 33,
    GetPlaybackMode = 34,
    SetPlaybackMode = 35,
    GetRecordMode = 36,
    SetRecordMode = 37,
    GetSessionAudioFormat = 38,
    SetSessionAudioFormat = 39,
    GetSessionSampleRate = 40,
    GetSessionBitDepth = 41,
    SetSessionBitDepth = 42,
    GetSessionInterleavedState = 43,
    SetSessionInterleavedState = 44,
    GetSessionTimeCodeRate = 45,
    SetSessionTimeCodeRate = 46,
    GetSessionFeetFramesRate = 47,
    SetSessionFeetFramesRate = 48,
    GetSessionAudioRatePullSettings = 49,
    SetSessionAudioRatePullSettings = 50,
    GetSessionVideoRatePullSettings = 51,
    SetSessionVideoRatePullSettings = 52,
    GetSessionName = 53,
    GetSessionPath = 54,
    GetSessionStartTime = 55,
    SetSessionStartTime = 56,
    GetSessionLength = 57,
    SetSessionLength = 58,
    GetTransportState = 59,
    GetTransportArmed = 60,
    RegisterConnection = 61,
    RenameSelectedClip = 62,
    RenameTargetClip = 63,
    TogglePlayState = 64,
    ToggleRecordEnable = 65,
    PlayHalfSpeed = 66,
    RecordHalfSpeed = 67,
    EditMemoryLocation = 68,
    GetMemoryLocations = 69,
    CreateMemoryLocation = 70,
    CreateNewTracks = 71,
    SelectTracksByName = 72,
    GetEditMode = 73,
    SetEditMode = 74,
    GetEditModeOptions = 75,
    SetEditModeOptions = 76,
    GetEditTool = 77,
    SetEditTool = 78,
    RecallZoomPreset = 79,
    GetTimelineSelection = 80,
    SetTimelineSelection = 81,
    SelectMemoryLocation = 82,
    SetTrackMuteState = 83,
    SetTrackSoloState = 84,
    SetTrackSoloSafeState = 85,
    SetTrackRecordSafeEnableState = 86,
    SetTrackInputMonitorState = 87,
    SetTrackSmartDspState = 88,
    SetTrackHiddenState = 89,
    SetTrackInactiveState = 90,
    SetTrackFrozenState = 91,
    SetTrackOnlineState = 92,
    GetSessionSystemDelayInfo = 93,
    GetSessionIDs = 94,
    GetEditSelection = 95,
    SetTrackRecordEnableState = 96,
}

impl CommandId {
    pub fn code(self) -> u32 {
        self as u32
    }

    /// Look up by name, with or without the host's `CId_` prefix.
    pub fn from_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix("CId_").unwrap_or(name);
        Self::ALL.iter().copied().find(|id| id.name() == bare)
    }

    /// Commands that make up the connection handshake.
    ///
    /// These are the only commands accepted before a connection is registered.
    pub fn is_handshake(self) -> bool {
        matches!(self, Self::AuthorizeConnection | Self::RegisterConnection)
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
