//! Built-in command table.
//!
//! Covers the connection handshake, task polling, and the session, track,
//! timeline and transport commands a typical remote-control tool issues.
//! Commands without an entry here are reported as unknown by the codec.

use crate::schema::FieldKind::{Bool, Enum, Float, Int, Message, String};
use crate::schema::{CommandSchema, EnumSchema, FieldSchema, MessageSchema};
use crate::CommandId;

// ---------------------------------------------------------------------------
// Enumerations
// ---------------------------------------------------------------------------

/// Host-side failure classification carried in error responses.
pub static COMMAND_ERROR_TYPE: EnumSchema = EnumSchema::new(
    "CommandErrorType",
    &[
        ("PT_UnknownError", 0),
        ("PT_InvalidParameter", 1),
        ("PT_NoOpenedSession", 2),
        ("PT_HostIsBusy", 3),
        ("PT_SessionIsAlreadyOpened", 4),
        ("PT_UnsupportedCommand", 5),
        ("PT_InvalidCommandState", 6),
        ("PT_FileNotFound", 7),
        ("SDK_VersionMismatch", 8),
        ("SDK_NotAuthorized", 9),
        ("SDK_NotRegistered", 10),
    ],
);

pub static TASK_STATUS: EnumSchema = EnumSchema::new(
    "TaskStatus",
    &[
        ("Queued", 0),
        ("Pending", 1),
        ("InProgress", 2),
        ("Completed", 3),
        ("Failed", 4),
        ("Cancelled", 5),
    ],
);

pub static SAMPLE_RATE: EnumSchema = EnumSchema::new(
    "SampleRate",
    &[
        ("SR_None", 0),
        ("SR_44100", 1),
        ("SR_48000", 2),
        ("SR_88200", 3),
        ("SR_96000", 4),
        ("SR_176400", 5),
        ("SR_192000", 6),
    ],
);

pub static FILE_TYPE: EnumSchema =
    EnumSchema::new("SessionAudioFormat", &[("FT_WAVE", 0), ("FT_AIFF", 1)]);

pub static BIT_DEPTH: EnumSchema = EnumSchema::new(
    "BitDepth",
    &[("Bit16", 0), ("Bit24", 1), ("Bit32Float", 2)],
);

pub static IO_SETTINGS: EnumSchema = EnumSchema::new(
    "IOSettings",
    &[
        ("IO_Last", 0),
        ("IO_StereoMix", 1),
        ("IO_51FilmMix", 2),
        ("IO_51SMPTEMix", 3),
        ("IO_51DTSMix", 4),
        ("IO_UserDefined", 5),
    ],
);

pub static TRACK_FORMAT: EnumSchema = EnumSchema::new(
    "TrackFormat",
    &[
        ("TF_None", 0),
        ("TF_Mono", 1),
        ("TF_Stereo", 2),
        ("TF_LCR", 3),
        ("TF_Quad", 4),
        ("TF_5_0", 5),
        ("TF_5_1", 6),
        ("TF_7_1", 7),
    ],
);

pub static TRACK_TYPE: EnumSchema = EnumSchema::new(
    "TrackType",
    &[
        ("TT_None", 0),
        ("TT_Midi", 1),
        ("TT_Audio", 2),
        ("TT_Aux", 3),
        ("TT_Video", 4),
        ("TT_Vca", 5),
        ("TT_Master", 6),
        ("TT_Instrument", 7),
        ("TT_Folder", 8),
    ],
);

pub static TRACK_TIMEBASE: EnumSchema = EnumSchema::new(
    "TrackTimebase",
    &[("TTB_None", 0), ("TTB_Samples", 1), ("TTB_Ticks", 2)],
);

pub static TRACK_INSERTION_POINT: EnumSchema = EnumSchema::new(
    "TrackInsertionPoint",
    &[
        ("TIPoint_Unknown", 0),
        ("TIPoint_Before", 1),
        ("TIPoint_After", 2),
        ("TIPoint_First", 3),
        ("TIPoint_Last", 4),
    ],
);

pub static TIME_PROPERTIES: EnumSchema = EnumSchema::new(
    "TimeProperties",
    &[("TP_Marker", 0), ("TP_Selection", 1), ("TP_None", 2)],
);

pub static MEMORY_LOCATION_REFERENCE: EnumSchema = EnumSchema::new(
    "MemoryLocationReference",
    &[
        ("MLR_BarBeat", 0),
        ("MLR_Absolute", 1),
        ("MLR_FollowTrackTimebase", 2),
    ],
);

pub static MEMORY_LOCATION_LOCATION: EnumSchema = EnumSchema::new(
    "MarkerLocation",
    &[
        ("MLC_Unknown", 0),
        ("MLC_MainRuler", 1),
        ("MLC_Track", 2),
        ("MLC_NamedRuler", 3),
        ("MLC_NewNamedRuler", 4),
    ],
);

pub static EDIT_MODE: EnumSchema = EnumSchema::new(
    "EditMode",
    &[
        ("EMO_Unknown", 0),
        ("EMO_Shuffle", 1),
        ("EMO_Slip", 2),
        ("EMO_Spot", 3),
        ("EMO_GridAbsolute", 4),
        ("EMO_GridRelative", 5),
        ("EMO_ShuffleSnapToGridAbsolute", 6),
    ],
);

pub static EDIT_TOOL: EnumSchema = EnumSchema::new(
    "EditTool",
    &[
        ("ET_Unknown", 0),
        ("ET_ZoomNormal", 1),
        ("ET_ZoomSingle", 2),
        ("ET_TrimStandard", 3),
        ("ET_TrimTCE", 4),
        ("ET_Selector", 5),
        ("ET_GrabberTime", 6),
        ("ET_Scrubber", 7),
        ("ET_PencilFreeHand", 8),
        ("ET_SmartTool", 9),
    ],
);

pub static TRANSPORT_STATE: EnumSchema = EnumSchema::new(
    "TransportState",
    &[
        ("TS_TransportStopped", 0),
        ("TS_TransportPlaying", 1),
        ("TS_TransportRecording", 2),
        ("TS_TransportPlayingHalfSpeed", 3),
        ("TS_TransportRecordingHalfSpeed", 4),
    ],
);

pub static TIME_SCALE: EnumSchema = EnumSchema::new(
    "TrackOffsetOptions",
    &[
        ("TimeCode", 0),
        ("Samples", 1),
        ("BarsBeats", 2),
        ("MinSecs", 3),
        ("FeetFrames", 4),
    ],
);

pub static EXPORT_FILE_TYPE: EnumSchema = EnumSchema::new(
    "EM_FileType",
    &[
        ("EM_WAV", 0),
        ("EM_AIFF", 1),
        ("EM_MP3", 2),
        ("EM_MOV", 3),
        ("EM_MP4", 4),
    ],
);

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

pub static EMPTY: MessageSchema = MessageSchema::new("Empty", &[]);

static CONNECTION_IDENTITY: MessageSchema = MessageSchema::new(
    "ConnectionIdentity",
    &[
        FieldSchema::required("company_name", String),
        FieldSchema::required("application_name", String),
    ],
);

static AUTHORIZE_CONNECTION_RESPONSE: MessageSchema = MessageSchema::new(
    "AuthorizeConnectionResponseBody",
    &[FieldSchema::optional("is_authorized", Bool)],
);

static REGISTER_CONNECTION_RESPONSE: MessageSchema = MessageSchema::new(
    "RegisterConnectionResponseBody",
    &[FieldSchema::optional("session_id", String)],
);

static HOST_READY_CHECK_RESPONSE: MessageSchema = MessageSchema::new(
    "HostReadyCheckResponseBody",
    &[FieldSchema::optional("is_host_ready", Bool)],
);

static GET_PTSL_VERSION_RESPONSE: MessageSchema = MessageSchema::new(
    "GetPTSLVersionResponseBody",
    &[FieldSchema::optional("version", Int)],
);

static GET_TASK_STATUS_REQUEST: MessageSchema = MessageSchema::new(
    "GetTaskStatusRequestBody",
    &[FieldSchema::required("task_id", String)],
);

pub static GET_TASK_STATUS_RESPONSE: MessageSchema = MessageSchema::new(
    "GetTaskStatusResponseBody",
    &[
        FieldSchema::optional("task_id", String),
        FieldSchema::optional("status", Enum(&TASK_STATUS)),
        FieldSchema::optional("progress", Float),
        FieldSchema::optional("task_error", String),
    ],
);

static CREATE_SESSION_REQUEST: MessageSchema = MessageSchema::new(
    "CreateSessionRequestBody",
    &[
        FieldSchema::required("session_name", String),
        FieldSchema::required("session_location", String),
        FieldSchema::optional("file_type", Enum(&FILE_TYPE)),
        FieldSchema::optional("sample_rate", Enum(&SAMPLE_RATE)),
        FieldSchema::optional("bit_depth", Enum(&BIT_DEPTH)),
        FieldSchema::optional("input_output_settings", Enum(&IO_SETTINGS)),
        FieldSchema::optional("is_interleaved", Bool),
        FieldSchema::optional("is_cloud_project", Bool),
        FieldSchema::optional("create_from_template", Bool),
        FieldSchema::optional("template_group", String),
        FieldSchema::optional("template_name", String),
    ],
);

static OPEN_SESSION_REQUEST: MessageSchema = MessageSchema::new(
    "OpenSessionRequestBody",
    &[FieldSchema::required("session_path", String)],
);

static CLOSE_SESSION_REQUEST: MessageSchema = MessageSchema::new(
    "CloseSessionRequestBody",
    &[FieldSchema::optional("save_on_close", Bool)],
);

static GET_SESSION_NAME_RESPONSE: MessageSchema = MessageSchema::new(
    "GetSessionNameResponseBody",
    &[FieldSchema::optional("session_name", String)],
);

static GET_SESSION_PATH_RESPONSE: MessageSchema = MessageSchema::new(
    "GetSessionPathResponseBody",
    &[FieldSchema::optional("session_path", String)],
);

static GET_SESSION_SAMPLE_RATE_RESPONSE: MessageSchema = MessageSchema::new(
    "GetSessionSampleRateResponseBody",
    &[FieldSchema::optional("sample_rate", Enum(&SAMPLE_RATE))],
);

static GET_SESSION_IDS_RESPONSE: MessageSchema = MessageSchema::new(
    "GetSessionIDsResponseBody",
    &[
        FieldSchema::optional("origin_id", String),
        FieldSchema::optional("instance_id", String),
        FieldSchema::optional("parent_id", String),
    ],
);

static TRACK: MessageSchema = MessageSchema::new(
    "Track",
    &[
        FieldSchema::optional("name", String),
        FieldSchema::optional("type", Enum(&TRACK_TYPE)),
        FieldSchema::optional("format", Enum(&TRACK_FORMAT)),
        FieldSchema::optional("id", String),
        FieldSchema::optional("index", Int),
    ],
);

static GET_TRACK_LIST_RESPONSE: MessageSchema = MessageSchema::new(
    "GetTrackListResponseBody",
    &[FieldSchema::repeated("track_list", Message(&TRACK))],
);

static CREATE_NEW_TRACKS_REQUEST: MessageSchema = MessageSchema::new(
    "CreateNewTracksRequestBody",
    &[
        FieldSchema::required("number_of_tracks", Int),
        FieldSchema::optional("track_name", String),
        FieldSchema::optional("track_format", Enum(&TRACK_FORMAT)),
        FieldSchema::optional("track_type", Enum(&TRACK_TYPE)),
        FieldSchema::optional("track_timebase", Enum(&TRACK_TIMEBASE)),
        FieldSchema::optional("insertion_point_position", Enum(&TRACK_INSERTION_POINT)),
        FieldSchema::optional("insertion_point_track_name", String),
    ],
);

static CREATE_NEW_TRACKS_RESPONSE: MessageSchema = MessageSchema::new(
    "CreateNewTracksResponseBody",
    &[
        FieldSchema::optional("number_of_tracks", Int),
        FieldSchema::repeated("created_track_names", String),
    ],
);

static TIMELINE_SELECTION: MessageSchema = MessageSchema::new(
    "TimelineSelection",
    &[
        FieldSchema::optional("play_start_marker_time", String),
        FieldSchema::optional("in_time", String),
        FieldSchema::optional("out_time", String),
        FieldSchema::optional("pre_roll_start_time", String),
        FieldSchema::optional("post_roll_stop_time", String),
        FieldSchema::optional("pre_roll_enabled", Bool),
        FieldSchema::optional("post_roll_enabled", Bool),
    ],
);

static GET_TIMELINE_SELECTION_REQUEST: MessageSchema = MessageSchema::new(
    "GetTimelineSelectionRequestBody",
    &[FieldSchema::optional("time_scale", Enum(&TIME_SCALE))],
);

static MEMORY_LOCATION_PROPERTIES: MessageSchema = MessageSchema::new(
    "MemoryLocationProperties",
    &[
        FieldSchema::optional("zoom_settings", Bool),
        FieldSchema::optional("pre_post_roll_times", Bool),
        FieldSchema::optional("track_visibility", Bool),
        FieldSchema::optional("track_heights", Bool),
        FieldSchema::optional("group_enables", Bool),
        FieldSchema::optional("window_configuration", Bool),
        FieldSchema::optional("window_configuration_index", Int),
        FieldSchema::optional("window_configuration_name", String),
    ],
);

static CREATE_MEMORY_LOCATION_REQUEST: MessageSchema = MessageSchema::new(
    "CreateMemoryLocationRequestBody",
    &[
        FieldSchema::optional("number", Int),
        FieldSchema::optional("name", String),
        FieldSchema::required("start_time", String),
        FieldSchema::optional("end_time", String),
        FieldSchema::optional("time_properties", Enum(&TIME_PROPERTIES)),
        FieldSchema::optional("reference", Enum(&MEMORY_LOCATION_REFERENCE)),
        FieldSchema::optional("general_properties", Message(&MEMORY_LOCATION_PROPERTIES)),
        FieldSchema::optional("comments", String),
        FieldSchema::optional("color_index", Int),
        FieldSchema::optional("location", Enum(&MEMORY_LOCATION_LOCATION)),
    ],
);

static MEMORY_LOCATION: MessageSchema = MessageSchema::new(
    "MemoryLocation",
    &[
        FieldSchema::optional("number", Int),
        FieldSchema::optional("name", String),
        FieldSchema::optional("start_time", String),
        FieldSchema::optional("end_time", String),
        FieldSchema::optional("time_properties", Enum(&TIME_PROPERTIES)),
        FieldSchema::optional("reference", Enum(&MEMORY_LOCATION_REFERENCE)),
        FieldSchema::optional("general_properties", Message(&MEMORY_LOCATION_PROPERTIES)),
        FieldSchema::optional("comments", String),
        FieldSchema::optional("color_index", Int),
        FieldSchema::optional("location", Enum(&MEMORY_LOCATION_LOCATION)),
    ],
);

static GET_MEMORY_LOCATIONS_RESPONSE: MessageSchema = MessageSchema::new(
    "GetMemoryLocationsResponseBody",
    &[FieldSchema::repeated("memory_locations", Message(&MEMORY_LOCATION))],
);

static SELECT_MEMORY_LOCATION_REQUEST: MessageSchema = MessageSchema::new(
    "SelectMemoryLocationRequestBody",
    &[FieldSchema::required("number", Int)],
);

static GET_EDIT_MODE_RESPONSE: MessageSchema = MessageSchema::new(
    "GetEditModeResponseBody",
    &[
        FieldSchema::optional("current_setting", Enum(&EDIT_MODE)),
        FieldSchema::repeated("possible_settings", Enum(&EDIT_MODE)),
    ],
);

static SET_EDIT_MODE_REQUEST: MessageSchema = MessageSchema::new(
    "SetEditModeRequestBody",
    &[FieldSchema::required("edit_mode", Enum(&EDIT_MODE))],
);

static GET_EDIT_TOOL_RESPONSE: MessageSchema = MessageSchema::new(
    "GetEditToolResponseBody",
    &[
        FieldSchema::optional("current_setting", Enum(&EDIT_TOOL)),
        FieldSchema::repeated("possible_settings", Enum(&EDIT_TOOL)),
    ],
);

static SET_EDIT_TOOL_REQUEST: MessageSchema = MessageSchema::new(
    "SetEditToolRequestBody",
    &[FieldSchema::required("edit_tool", Enum(&EDIT_TOOL))],
);

static RECALL_ZOOM_PRESET_REQUEST: MessageSchema = MessageSchema::new(
    "RecallZoomPresetRequestBody",
    &[FieldSchema::required("zoom_preset", Int)],
);

static GET_TRANSPORT_STATE_RESPONSE: MessageSchema = MessageSchema::new(
    "GetTransportStateResponseBody",
    &[
        FieldSchema::optional("current_setting", Enum(&TRANSPORT_STATE)),
        FieldSchema::repeated("possible_settings", Enum(&TRANSPORT_STATE)),
    ],
);

/// Shared by every `SetTrack*State` command.
static TRACK_STATE_REQUEST: MessageSchema = MessageSchema::new(
    "SetTrackStateRequestBody",
    &[
        FieldSchema::repeated("track_names", String),
        FieldSchema::optional("enabled", Bool),
    ],
);

static EXPORT_LOCATION: MessageSchema = MessageSchema::new(
    "EM_LocationInfo",
    &[
        FieldSchema::optional("directory", String),
        FieldSchema::optional("import_after_bounce", Bool),
    ],
);

static EXPORT_MIX_REQUEST: MessageSchema = MessageSchema::new(
    "ExportMixRequestBody",
    &[
        FieldSchema::required("file_name", String),
        FieldSchema::optional("file_type", Enum(&EXPORT_FILE_TYPE)),
        FieldSchema::optional("location_info", Message(&EXPORT_LOCATION)),
        FieldSchema::optional("offline_bounce", Bool),
    ],
);

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub static COMMANDS: &[CommandSchema] = &[
    CommandSchema::new(
        CommandId::AuthorizeConnection,
        &CONNECTION_IDENTITY,
        &AUTHORIZE_CONNECTION_RESPONSE,
    ),
    CommandSchema::new(
        CommandId::RegisterConnection,
        &CONNECTION_IDENTITY,
        &REGISTER_CONNECTION_RESPONSE,
    ),
    CommandSchema::new(CommandId::HostReadyCheck, &EMPTY, &HOST_READY_CHECK_RESPONSE),
    CommandSchema::new(CommandId::GetPTSLVersion, &EMPTY, &GET_PTSL_VERSION_RESPONSE),
    CommandSchema::new(
        CommandId::GetTaskStatus,
        &GET_TASK_STATUS_REQUEST,
        &GET_TASK_STATUS_RESPONSE,
    ),
    CommandSchema::new(CommandId::CreateSession, &CREATE_SESSION_REQUEST, &EMPTY),
    CommandSchema::new(CommandId::OpenSession, &OPEN_SESSION_REQUEST, &EMPTY),
    CommandSchema::new(CommandId::SaveSession, &EMPTY, &EMPTY),
    CommandSchema::new(CommandId::CloseSession, &CLOSE_SESSION_REQUEST, &EMPTY),
    CommandSchema::new(CommandId::GetSessionName, &EMPTY, &GET_SESSION_NAME_RESPONSE),
    CommandSchema::new(CommandId::GetSessionPath, &EMPTY, &GET_SESSION_PATH_RESPONSE),
    CommandSchema::new(
        CommandId::GetSessionSampleRate,
        &EMPTY,
        &GET_SESSION_SAMPLE_RATE_RESPONSE,
    ),
    CommandSchema::new(CommandId::GetSessionIDs, &EMPTY, &GET_SESSION_IDS_RESPONSE),
    CommandSchema::new(CommandId::GetTrackList, &EMPTY, &GET_TRACK_LIST_RESPONSE),
    CommandSchema::new(
        CommandId::CreateNewTracks,
        &CREATE_NEW_TRACKS_REQUEST,
        &CREATE_NEW_TRACKS_RESPONSE,
    ),
    CommandSchema::new(CommandId::SetTimelineSelection, &TIMELINE_SELECTION, &EMPTY),
    CommandSchema::new(
        CommandId::GetTimelineSelection,
        &GET_TIMELINE_SELECTION_REQUEST,
        &TIMELINE_SELECTION,
    ),
    CommandSchema::new(
        CommandId::CreateMemoryLocation,
        &CREATE_MEMORY_LOCATION_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(
        CommandId::GetMemoryLocations,
        &EMPTY,
        &GET_MEMORY_LOCATIONS_RESPONSE,
    ),
    CommandSchema::new(
        CommandId::SelectMemoryLocation,
        &SELECT_MEMORY_LOCATION_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(CommandId::TogglePlayState, &EMPTY, &EMPTY),
    CommandSchema::new(
        CommandId::GetTransportState,
        &EMPTY,
        &GET_TRANSPORT_STATE_RESPONSE,
    ),
    CommandSchema::new(CommandId::GetEditMode, &EMPTY, &GET_EDIT_MODE_RESPONSE),
    CommandSchema::new(CommandId::SetEditMode, &SET_EDIT_MODE_REQUEST, &EMPTY),
    CommandSchema::new(CommandId::GetEditTool, &EMPTY, &GET_EDIT_TOOL_RESPONSE),
    CommandSchema::new(CommandId::SetEditTool, &SET_EDIT_TOOL_REQUEST, &EMPTY),
    CommandSchema::new(
        CommandId::RecallZoomPreset,
        &RECALL_ZOOM_PRESET_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(CommandId::SetTrackMuteState, &TRACK_STATE_REQUEST, &EMPTY),
    CommandSchema::new(CommandId::SetTrackSoloState, &TRACK_STATE_REQUEST, &EMPTY),
    CommandSchema::new(
        CommandId::SetTrackSoloSafeState,
        &TRACK_STATE_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(
        CommandId::SetTrackRecordSafeEnableState,
        &TRACK_STATE_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(
        CommandId::SetTrackRecordEnableState,
        &TRACK_STATE_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(
        CommandId::SetTrackInputMonitorState,
        &TRACK_STATE_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(
        CommandId::SetTrackSmartDspState,
        &TRACK_STATE_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(CommandId::SetTrackHiddenState, &TRACK_STATE_REQUEST, &EMPTY),
    CommandSchema::new(
        CommandId::SetTrackInactiveState,
        &TRACK_STATE_REQUEST,
        &EMPTY,
    ),
    CommandSchema::new(CommandId::SetTrackFrozenState, &TRACK_STATE_REQUEST, &EMPTY),
    CommandSchema::new(CommandId::SetTrackOnlineState, &TRACK_STATE_REQUEST, &EMPTY),
    CommandSchema::long_running(CommandId::ExportMix, &EXPORT_MIX_REQUEST, &EMPTY),
];
