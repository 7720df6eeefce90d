// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

//! The static rule table: every command, command role, option group, and
//! option the engine knows about, plus the per-(command, option) optional
//! data stream (defaults, allow lists, allow ranges, depends, required
//! overrides).
//!
//! Everything here is read-only after startup. Option metadata that varies by
//! command lives in the `data` stream of each rule: an
//! [`OptionData::Command`] record scopes the records that follow it until the
//! next `Command` record or end of stream, and lookups return the last
//! matching record, preferring a command-scoped match over an unscoped one.

pub const COMMAND_TOTAL: usize = 15;
pub const OPTION_TOTAL: usize = 45;
pub const GROUP_TOTAL: usize = 2;
pub const ROLE_TOTAL: usize = 4;

/// User-visible key indexes run from 1 through `KEY_MAX` inclusive.
pub const KEY_MAX: u32 = 255;

/// Baked-in default locations. The legacy single-file fallback is derived
/// from the binary name at parse time (see `crate::bin_name`).
pub(crate) const CONFIG_FILE_DEFAULT: &str = "/etc/pgbackrest/pgbackrest.conf";
pub(crate) const CONFIG_INCLUDE_PATH_DEFAULT: &str = "/etc/pgbackrest/conf.d";

/// Prefix for environment variable import.
pub(crate) const ENV_PREFIX: &str = "PGBACKREST_";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CommandId {
    ArchiveGet,
    ArchivePush,
    Backup,
    Check,
    Expire,
    Help,
    Info,
    Restore,
    StanzaCreate,
    StanzaDelete,
    StanzaUpgrade,
    Start,
    Stop,
    Verify,
    Version,
}

impl CommandId {
    pub fn name(self) -> &'static str {
        COMMANDS[self as usize].name
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum CommandRole {
    Default,
    Async,
    Local,
    Remote,
}

impl CommandRole {
    pub fn name(self) -> &'static str {
        match self {
            CommandRole::Default => "default",
            CommandRole::Async => "async",
            CommandRole::Local => "local",
            CommandRole::Remote => "remote",
        }
    }
}

pub(crate) fn role_find(name: &str) -> Option<CommandRole> {
    match name {
        "default" => Some(CommandRole::Default),
        "async" => Some(CommandRole::Async),
        "local" => Some(CommandRole::Local),
        "remote" => Some(CommandRole::Remote),
        _ => None,
    }
}

type RoleMask = u8;

const R_DEFAULT: RoleMask = 1;
const R_ASYNC: RoleMask = 2;
const R_LOCAL: RoleMask = 4;
const R_REMOTE: RoleMask = 8;

pub struct CommandRule {
    pub name: &'static str,
    pub roles: RoleMask,
    pub parameters_allowed: bool,
}

pub(crate) type CommandMask = u32;

const fn m(list: &[CommandId]) -> CommandMask {
    let mut mask = 0;
    let mut i = 0;
    while i < list.len() {
        mask |= 1 << list[i] as u32;
        i += 1;
    }
    mask
}

const fn every_role(mask: CommandMask) -> [CommandMask; ROLE_TOTAL] {
    [mask, mask, mask, mask]
}

const fn default_role(mask: CommandMask) -> [CommandMask; ROLE_TOTAL] {
    [mask, 0, 0, 0]
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GroupId {
    Pg,
    Repo,
}

pub struct GroupRule {
    /// Textual prefix shared by the group's options and used to render
    /// key-indexed names.
    pub name: &'static str,
    /// The pg group numbers key indexes by user key with index 0 reserved,
    /// so the historical `pg1` semantics survive index-map translation.
    /// Other groups store user key N at key index N-1.
    pub reserve_key_one: bool,
    /// The ungrouped option whose value selects the group's default index.
    pub select: OptionId,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OptionType {
    Boolean,
    Hash,
    Integer,
    List,
    Path,
    Size,
    String,
    Time,
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Section {
    CommandLineOnly,
    Global,
    Stanza,
}

#[derive(Debug)]
pub enum OptionData {
    AllowList(&'static [&'static str]),
    /// Bounds in the option type's native unit: bytes for size, milliseconds
    /// for time, the raw value for integer.
    AllowRange(i64, i64),
    /// Scopes the records that follow to one command.
    Command(CommandId),
    /// Default value string, parsed by the option's type. Boolean defaults
    /// are `"0"` or `"1"`.
    Default(&'static str),
    /// The option is only valid when `on` has a value, optionally restricted
    /// to `values`. Boolean depend targets compare as `"0"`/`"1"`.
    Depend {
        on: OptionId,
        values: &'static [&'static str],
    },
    Required(bool),
}

pub struct OptionRule {
    pub name: &'static str,
    pub option_type: OptionType,
    pub section: Section,
    pub secure: bool,
    pub multi: bool,
    /// Negation permitted. True for every boolean, plus `config`, whose
    /// negated form suppresses loading of the main configuration file.
    pub negate: bool,
    /// Base required flag; `Required` records override it per command.
    pub required: bool,
    pub group: Option<GroupId>,
    pub valid: [CommandMask; ROLE_TOTAL],
    pub data: &'static [OptionData],
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OptionId {
    ArchiveAsync,
    ArchiveTimeout,
    BufferSize,
    CompressLevel,
    CompressType,
    Config,
    ConfigIncludePath,
    ConfigPath,
    DbInclude,
    DbTimeout,
    Delta,
    DryRun,
    Exclude,
    Force,
    LinkMap,
    LogLevelConsole,
    LogLevelFile,
    LogPath,
    Online,
    Output,
    Pg,
    PgHost,
    PgHostPort,
    PgHostUser,
    PgPath,
    PgPort,
    ProcessMax,
    ProtocolTimeout,
    RecoveryOption,
    Repo,
    RepoCipherPass,
    RepoCipherType,
    RepoHost,
    RepoHostUser,
    RepoPath,
    RepoRetentionFull,
    RepoS3Bucket,
    RepoS3Endpoint,
    RepoS3Region,
    RepoType,
    Set,
    SpoolPath,
    Stanza,
    Target,
    Type,
}

impl OptionId {
    pub fn name(self) -> &'static str {
        OPTIONS[self as usize].name
    }

    pub fn iter() -> impl Iterator<Item = OptionId> {
        OPTION_IDS.iter().copied()
    }
}

pub(crate) struct Deprecation {
    pub alias: &'static str,
    pub option: OptionId,
    pub user_key: u32,
}

pub(crate) static COMMANDS: [CommandRule; COMMAND_TOTAL] = {
    const ALL: RoleMask = R_DEFAULT | R_ASYNC | R_LOCAL | R_REMOTE;
    const DLR: RoleMask = R_DEFAULT | R_LOCAL | R_REMOTE;
    [
        CommandRule {
            name: "archive-get",
            roles: ALL,
            parameters_allowed: true,
        },
        CommandRule {
            name: "archive-push",
            roles: ALL,
            parameters_allowed: true,
        },
        CommandRule {
            name: "backup",
            roles: DLR,
            parameters_allowed: false,
        },
        CommandRule {
            name: "check",
            roles: DLR,
            parameters_allowed: false,
        },
        CommandRule {
            name: "expire",
            roles: R_DEFAULT | R_REMOTE,
            parameters_allowed: false,
        },
        CommandRule {
            name: "help",
            roles: R_DEFAULT,
            parameters_allowed: true,
        },
        CommandRule {
            name: "info",
            roles: R_DEFAULT | R_REMOTE,
            parameters_allowed: false,
        },
        CommandRule {
            name: "restore",
            roles: DLR,
            parameters_allowed: false,
        },
        CommandRule {
            name: "stanza-create",
            roles: DLR,
            parameters_allowed: false,
        },
        CommandRule {
            name: "stanza-delete",
            roles: DLR,
            parameters_allowed: false,
        },
        CommandRule {
            name: "stanza-upgrade",
            roles: DLR,
            parameters_allowed: false,
        },
        CommandRule {
            name: "start",
            roles: R_DEFAULT,
            parameters_allowed: false,
        },
        CommandRule {
            name: "stop",
            roles: R_DEFAULT,
            parameters_allowed: false,
        },
        CommandRule {
            name: "verify",
            roles: DLR,
            parameters_allowed: false,
        },
        CommandRule {
            name: "version",
            roles: R_DEFAULT,
            parameters_allowed: false,
        },
    ]
};

pub(crate) static GROUP_IDS: [GroupId; GROUP_TOTAL] = [GroupId::Pg, GroupId::Repo];

pub(crate) static GROUPS: [GroupRule; GROUP_TOTAL] = [
    GroupRule {
        name: "pg",
        reserve_key_one: true,
        select: OptionId::Pg,
    },
    GroupRule {
        name: "repo",
        reserve_key_one: false,
        select: OptionId::Repo,
    },
];

pub(crate) static DEPRECATIONS: [Deprecation; 4] = [
    Deprecation {
        alias: "backup-host",
        option: OptionId::RepoHost,
        user_key: 1,
    },
    Deprecation {
        alias: "db-host",
        option: OptionId::PgHost,
        user_key: 1,
    },
    Deprecation {
        alias: "db-path",
        option: OptionId::PgPath,
        user_key: 1,
    },
    Deprecation {
        alias: "db-port",
        option: OptionId::PgPort,
        user_key: 1,
    },
];

static LOG_LEVELS: [&str; 7] = ["off", "error", "warn", "info", "detail", "debug", "trace"];

pub(crate) static OPTIONS: [OptionRule; OPTION_TOTAL] = {
    use CommandId::*;
    use OptionData as D;

    const CMD_ALL: CommandMask = m(&[
        ArchiveGet,
        ArchivePush,
        Backup,
        Check,
        Expire,
        Help,
        Info,
        Restore,
        StanzaCreate,
        StanzaDelete,
        StanzaUpgrade,
        Start,
        Stop,
        Verify,
        Version,
    ]);
    // Commands that touch a repository.
    const CMD_REPO: CommandMask = m(&[
        ArchiveGet,
        ArchivePush,
        Backup,
        Check,
        Expire,
        Info,
        Restore,
        StanzaCreate,
        StanzaDelete,
        StanzaUpgrade,
        Verify,
    ]);
    // Commands that touch a PostgreSQL cluster.
    const CMD_PG: CommandMask = m(&[
        Backup,
        Check,
        Restore,
        StanzaCreate,
        StanzaDelete,
        StanzaUpgrade,
    ]);

    [
        // archive-async
        OptionRule {
            name: "archive-async",
            option_type: OptionType::Boolean,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: true,
            required: false,
            group: None,
            valid: every_role(m(&[ArchiveGet, ArchivePush])),
            data: &[D::Default("0")],
        },
        // archive-timeout
        OptionRule {
            name: "archive-timeout",
            option_type: OptionType::Time,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[ArchivePush, Check])),
            data: &[D::Default("60"), D::AllowRange(100, 86_400_000)],
        },
        // buffer-size
        OptionRule {
            name: "buffer-size",
            option_type: OptionType::Size,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_REPO),
            data: &[D::Default("1mb"), D::AllowRange(16_384, 16_777_216)],
        },
        // compress-level
        OptionRule {
            name: "compress-level",
            option_type: OptionType::Integer,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[ArchivePush, Backup])),
            data: &[
                D::Default("6"),
                D::AllowRange(0, 9),
                D::Depend {
                    on: OptionId::CompressType,
                    values: &["bz2", "gz", "lz4", "zst"],
                },
            ],
        },
        // compress-type
        OptionRule {
            name: "compress-type",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[ArchivePush, Backup])),
            data: &[
                D::Default("gz"),
                D::AllowList(&["none", "bz2", "gz", "lz4", "zst"]),
            ],
        },
        // config
        OptionRule {
            name: "config",
            option_type: OptionType::String,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: true,
            required: false,
            group: None,
            valid: every_role(CMD_ALL),
            data: &[D::Default(CONFIG_FILE_DEFAULT)],
        },
        // config-include-path
        OptionRule {
            name: "config-include-path",
            option_type: OptionType::String,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_ALL),
            data: &[D::Default(CONFIG_INCLUDE_PATH_DEFAULT)],
        },
        // config-path
        OptionRule {
            name: "config-path",
            option_type: OptionType::Path,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_ALL),
            data: &[],
        },
        // db-include
        OptionRule {
            name: "db-include",
            option_type: OptionType::List,
            section: Section::Stanza,
            secure: false,
            multi: true,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[Restore])),
            data: &[],
        },
        // db-timeout
        OptionRule {
            name: "db-timeout",
            option_type: OptionType::Time,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_PG),
            data: &[D::Default("1800"), D::AllowRange(100, 604_800_000)],
        },
        // delta
        OptionRule {
            name: "delta",
            option_type: OptionType::Boolean,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: true,
            required: false,
            group: None,
            valid: every_role(m(&[Backup, Restore])),
            data: &[D::Default("0")],
        },
        // dry-run
        OptionRule {
            name: "dry-run",
            option_type: OptionType::Boolean,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: true,
            required: false,
            group: None,
            valid: default_role(m(&[Backup, Expire])),
            data: &[D::Default("0")],
        },
        // exclude
        OptionRule {
            name: "exclude",
            option_type: OptionType::List,
            section: Section::Global,
            secure: false,
            multi: true,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[Backup])),
            data: &[],
        },
        // force
        OptionRule {
            name: "force",
            option_type: OptionType::Boolean,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: true,
            required: false,
            group: None,
            valid: every_role(m(&[Backup, Restore, StanzaCreate, StanzaDelete, Stop])),
            data: &[D::Default("0")],
        },
        // link-map
        OptionRule {
            name: "link-map",
            option_type: OptionType::Hash,
            section: Section::Stanza,
            secure: false,
            multi: true,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[Restore])),
            data: &[],
        },
        // log-level-console
        OptionRule {
            name: "log-level-console",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_ALL),
            data: &[D::Default("warn"), D::AllowList(&LOG_LEVELS)],
        },
        // log-level-file
        OptionRule {
            name: "log-level-file",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_ALL),
            data: &[D::Default("info"), D::AllowList(&LOG_LEVELS)],
        },
        // log-path
        OptionRule {
            name: "log-path",
            option_type: OptionType::Path,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_ALL),
            data: &[D::Default("/var/log/pgbackrest")],
        },
        // online
        OptionRule {
            name: "online",
            option_type: OptionType::Boolean,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: true,
            required: false,
            group: None,
            valid: every_role(m(&[Backup, Check, StanzaCreate])),
            data: &[D::Default("1")],
        },
        // output
        OptionRule {
            name: "output",
            option_type: OptionType::String,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: default_role(m(&[Info])),
            data: &[D::Default("text"), D::AllowList(&["text", "json"])],
        },
        // pg
        OptionRule {
            name: "pg",
            option_type: OptionType::Integer,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_PG),
            data: &[D::AllowRange(1, KEY_MAX as i64)],
        },
        // pg-host
        OptionRule {
            name: "pg-host",
            option_type: OptionType::String,
            section: Section::Stanza,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Pg),
            valid: every_role(CMD_PG),
            data: &[],
        },
        // pg-host-port
        OptionRule {
            name: "pg-host-port",
            option_type: OptionType::Integer,
            section: Section::Stanza,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Pg),
            valid: every_role(CMD_PG),
            data: &[
                D::AllowRange(1, 65_535),
                D::Depend {
                    on: OptionId::PgHost,
                    values: &[],
                },
            ],
        },
        // pg-host-user
        OptionRule {
            name: "pg-host-user",
            option_type: OptionType::String,
            section: Section::Stanza,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Pg),
            valid: every_role(CMD_PG),
            data: &[
                D::Default("postgres"),
                D::Depend {
                    on: OptionId::PgHost,
                    values: &[],
                },
            ],
        },
        // pg-path
        OptionRule {
            name: "pg-path",
            option_type: OptionType::Path,
            section: Section::Stanza,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Pg),
            valid: every_role(m(&[
                ArchiveGet,
                ArchivePush,
                Backup,
                Check,
                Restore,
                StanzaCreate,
                StanzaDelete,
                StanzaUpgrade,
                Verify,
            ])),
            data: &[
                D::Command(Check),
                D::Required(true),
                D::Command(Restore),
                D::Required(true),
                D::Command(StanzaCreate),
                D::Required(true),
                D::Command(StanzaUpgrade),
                D::Required(true),
            ],
        },
        // pg-port
        OptionRule {
            name: "pg-port",
            option_type: OptionType::Integer,
            section: Section::Stanza,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Pg),
            valid: every_role(CMD_PG),
            data: &[D::Default("5432"), D::AllowRange(1, 65_535)],
        },
        // process-max
        OptionRule {
            name: "process-max",
            option_type: OptionType::Integer,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[
                ArchiveGet,
                ArchivePush,
                Backup,
                Check,
                Restore,
                Verify,
            ])),
            data: &[D::Default("1"), D::AllowRange(1, 999)],
        },
        // protocol-timeout
        OptionRule {
            name: "protocol-timeout",
            option_type: OptionType::Time,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(CMD_REPO),
            data: &[D::Default("1830"), D::AllowRange(100, 604_800_000)],
        },
        // recovery-option
        OptionRule {
            name: "recovery-option",
            option_type: OptionType::Hash,
            section: Section::Stanza,
            secure: false,
            multi: true,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[Restore])),
            data: &[],
        },
        // repo
        OptionRule {
            name: "repo",
            option_type: OptionType::Integer,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[
                ArchiveGet,
                ArchivePush,
                Backup,
                Check,
                Expire,
                Info,
                Restore,
                Verify,
            ])),
            data: &[D::AllowRange(1, KEY_MAX as i64)],
        },
        // repo-cipher-pass
        OptionRule {
            name: "repo-cipher-pass",
            option_type: OptionType::String,
            section: Section::Global,
            secure: true,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[D::Depend {
                on: OptionId::RepoCipherType,
                values: &["aes-256-cbc"],
            }],
        },
        // repo-cipher-type
        OptionRule {
            name: "repo-cipher-type",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[
                D::Default("none"),
                D::AllowList(&["none", "aes-256-cbc"]),
            ],
        },
        // repo-host
        OptionRule {
            name: "repo-host",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[],
        },
        // repo-host-user
        OptionRule {
            name: "repo-host-user",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[
                D::Default("pgbackrest"),
                D::Depend {
                    on: OptionId::RepoHost,
                    values: &[],
                },
            ],
        },
        // repo-path
        OptionRule {
            name: "repo-path",
            option_type: OptionType::Path,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[D::Default("/var/lib/pgbackrest")],
        },
        // repo-retention-full
        OptionRule {
            name: "repo-retention-full",
            option_type: OptionType::Integer,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(m(&[Backup, Expire])),
            data: &[D::AllowRange(1, 9_999_999)],
        },
        // repo-s3-bucket
        OptionRule {
            name: "repo-s3-bucket",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[D::Depend {
                on: OptionId::RepoType,
                values: &["s3"],
            }],
        },
        // repo-s3-endpoint
        OptionRule {
            name: "repo-s3-endpoint",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[D::Depend {
                on: OptionId::RepoType,
                values: &["s3"],
            }],
        },
        // repo-s3-region
        OptionRule {
            name: "repo-s3-region",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[D::Depend {
                on: OptionId::RepoType,
                values: &["s3"],
            }],
        },
        // repo-type
        OptionRule {
            name: "repo-type",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: Some(GroupId::Repo),
            valid: every_role(CMD_REPO),
            data: &[
                D::Default("posix"),
                D::AllowList(&["azure", "cifs", "gcs", "posix", "s3"]),
            ],
        },
        // set
        OptionRule {
            name: "set",
            option_type: OptionType::String,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: default_role(m(&[Info, Restore])),
            data: &[],
        },
        // spool-path
        OptionRule {
            name: "spool-path",
            option_type: OptionType::Path,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[ArchiveGet, ArchivePush])),
            data: &[
                D::Default("/var/spool/pgbackrest"),
                D::Depend {
                    on: OptionId::ArchiveAsync,
                    values: &["1"],
                },
            ],
        },
        // stanza
        OptionRule {
            name: "stanza",
            option_type: OptionType::String,
            section: Section::Global,
            secure: false,
            multi: false,
            negate: false,
            required: true,
            group: None,
            valid: every_role(m(&[
                ArchiveGet,
                ArchivePush,
                Backup,
                Check,
                Expire,
                Info,
                Restore,
                StanzaCreate,
                StanzaDelete,
                StanzaUpgrade,
                Start,
                Stop,
                Verify,
            ])),
            data: &[
                D::Command(Info),
                D::Required(false),
                D::Command(Start),
                D::Required(false),
                D::Command(Stop),
                D::Required(false),
            ],
        },
        // target
        OptionRule {
            name: "target",
            option_type: OptionType::String,
            section: Section::Stanza,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[Restore])),
            data: &[D::Depend {
                on: OptionId::Type,
                values: &["lsn", "name", "time", "xid"],
            }],
        },
        // type
        OptionRule {
            name: "type",
            option_type: OptionType::String,
            section: Section::CommandLineOnly,
            secure: false,
            multi: false,
            negate: false,
            required: false,
            group: None,
            valid: every_role(m(&[Backup, Restore])),
            data: &[
                D::Command(Backup),
                D::Default("incr"),
                D::AllowList(&["diff", "full", "incr"]),
                D::Command(Restore),
                D::Default("default"),
                D::AllowList(&[
                    "default",
                    "immediate",
                    "lsn",
                    "name",
                    "none",
                    "preserve",
                    "standby",
                    "time",
                    "xid",
                ]),
            ],
        },
    ]
};

static OPTION_IDS: [OptionId; OPTION_TOTAL] = {
    use OptionId::*;
    [
        ArchiveAsync,
        ArchiveTimeout,
        BufferSize,
        CompressLevel,
        CompressType,
        Config,
        ConfigIncludePath,
        ConfigPath,
        DbInclude,
        DbTimeout,
        Delta,
        DryRun,
        Exclude,
        Force,
        LinkMap,
        LogLevelConsole,
        LogLevelFile,
        LogPath,
        Online,
        Output,
        Pg,
        PgHost,
        PgHostPort,
        PgHostUser,
        PgPath,
        PgPort,
        ProcessMax,
        ProtocolTimeout,
        RecoveryOption,
        Repo,
        RepoCipherPass,
        RepoCipherType,
        RepoHost,
        RepoHostUser,
        RepoPath,
        RepoRetentionFull,
        RepoS3Bucket,
        RepoS3Endpoint,
        RepoS3Region,
        RepoType,
        Set,
        SpoolPath,
        Stanza,
        Target,
        Type,
    ]
};

/// The order options are materialised in: a topological order of the depend
/// graph, so every depend check reads an already-materialised value. Mostly
/// alphabetical, with depend targets hoisted above their dependents. Checked
/// for permutation and topology by the rules tests.
pub(crate) static RESOLVE_ORDER: [OptionId; OPTION_TOTAL] = {
    use OptionId::*;
    [
        ArchiveAsync,
        ArchiveTimeout,
        BufferSize,
        CompressType,
        CompressLevel,
        Config,
        ConfigIncludePath,
        ConfigPath,
        DbInclude,
        DbTimeout,
        Delta,
        DryRun,
        Exclude,
        Force,
        LinkMap,
        LogLevelConsole,
        LogLevelFile,
        LogPath,
        Online,
        Output,
        Pg,
        PgHost,
        PgHostPort,
        PgHostUser,
        PgPath,
        PgPort,
        ProcessMax,
        ProtocolTimeout,
        RecoveryOption,
        Repo,
        RepoCipherType,
        RepoCipherPass,
        RepoHost,
        RepoHostUser,
        RepoPath,
        RepoRetentionFull,
        RepoType,
        RepoS3Bucket,
        RepoS3Endpoint,
        RepoS3Region,
        Set,
        SpoolPath,
        Stanza,
        Type,
        Target,
    ]
};

pub(crate) fn command(id: CommandId) -> &'static CommandRule {
    &COMMANDS[id as usize]
}

pub(crate) fn option(id: OptionId) -> &'static OptionRule {
    &OPTIONS[id as usize]
}

pub(crate) fn group(id: GroupId) -> &'static GroupRule {
    &GROUPS[id as usize]
}

pub(crate) fn command_find(name: &str) -> Option<CommandId> {
    COMMAND_IDS.iter().copied().find(|c| c.name() == name)
}

static COMMAND_IDS: [CommandId; COMMAND_TOTAL] = {
    use CommandId::*;
    [
        ArchiveGet,
        ArchivePush,
        Backup,
        Check,
        Expire,
        Help,
        Info,
        Restore,
        StanzaCreate,
        StanzaDelete,
        StanzaUpgrade,
        Start,
        Stop,
        Verify,
        Version,
    ]
};

pub(crate) fn command_role_valid(cmd: CommandId, role: CommandRole) -> bool {
    command(cmd).roles & (1 << role as u8) != 0
}

pub(crate) fn option_valid(cmd: CommandId, role: CommandRole, opt: OptionId) -> bool {
    option(opt).valid[role as usize] & (1 << cmd as u32) != 0
}

pub(crate) fn option_find(name: &str) -> Option<OptionId> {
    OptionId::iter().find(|id| id.name() == name)
}

/// Map a user-visible key (1-based) to the key index the engine stores.
pub(crate) fn key_index(g: GroupId, user_key: u32) -> u32 {
    if group(g).reserve_key_one {
        user_key
    } else {
        user_key - 1
    }
}

/// Map a stored key index back to the user-visible key.
pub(crate) fn user_key(g: GroupId, key_index: u32) -> u32 {
    if group(g).reserve_key_one {
        key_index
    } else {
        key_index + 1
    }
}

/// Key index used when no keys are in use for the group.
pub(crate) fn default_key_index(g: GroupId) -> u32 {
    key_index(g, 1)
}

/// Walk an option's data stream and return the last record the predicate
/// accepts, preferring a command-scoped record over an unscoped one.
fn find_data(
    opt: OptionId,
    cmd: CommandId,
    pred: impl Fn(&'static OptionData) -> bool,
) -> Option<&'static OptionData> {
    let mut scoped = None;
    let mut unscoped = None;
    let mut scope: Option<CommandId> = None;
    for record in option(opt).data {
        if let OptionData::Command(c) = record {
            scope = Some(*c);
        } else if pred(record) {
            match scope {
                None => unscoped = Some(record),
                Some(c) if c == cmd => scoped = Some(record),
                Some(_) => {}
            }
        }
    }
    scoped.or(unscoped)
}

pub(crate) fn default_value(cmd: CommandId, opt: OptionId) -> Option<&'static str> {
    match find_data(opt, cmd, |r| matches!(r, OptionData::Default(_))) {
        Some(OptionData::Default(value)) => Some(*value),
        _ => None,
    }
}

pub(crate) fn allow_list(cmd: CommandId, opt: OptionId) -> Option<&'static [&'static str]> {
    match find_data(opt, cmd, |r| matches!(r, OptionData::AllowList(_))) {
        Some(OptionData::AllowList(list)) => Some(*list),
        _ => None,
    }
}

pub(crate) fn allow_range(cmd: CommandId, opt: OptionId) -> Option<(i64, i64)> {
    match find_data(opt, cmd, |r| matches!(r, OptionData::AllowRange(..))) {
        Some(OptionData::AllowRange(min, max)) => Some((*min, *max)),
        _ => None,
    }
}

pub(crate) fn depend(
    cmd: CommandId,
    opt: OptionId,
) -> Option<(OptionId, &'static [&'static str])> {
    match find_data(opt, cmd, |r| matches!(r, OptionData::Depend { .. })) {
        Some(OptionData::Depend { on, values }) => Some((*on, *values)),
        _ => None,
    }
}

pub(crate) fn required(cmd: CommandId, opt: OptionId) -> bool {
    match find_data(opt, cmd, |r| matches!(r, OptionData::Required(_))) {
        Some(OptionData::Required(required)) => *required,
        _ => option(opt).required,
    }
}

/// True when the option has a default under any command scope. Reset is only
/// meaningful for such options.
pub(crate) fn has_default(opt: OptionId) -> bool {
    option(opt)
        .data
        .iter()
        .any(|r| matches!(r, OptionData::Default(_)))
}
