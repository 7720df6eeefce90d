// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use maplit::btreemap;

use crate::args::{Args, parse_args};
use crate::error::ParseError;
use crate::files::merge;
use crate::ini::Ini;
use crate::resolve::resolve;
use crate::rules::GroupId;
use crate::rules::OptionId;
use crate::state::ParseState;
use crate::{ConfigOption, ConfigOptionGroup, Source, Value};

fn run(
    strings: &[&str],
    config: Option<&str>,
) -> Result<(Vec<ConfigOption>, Vec<ConfigOptionGroup>), ParseError> {
    let mut state = ParseState::new();
    let command_line = parse_args(
        &Args::new(strings.iter().map(|s| s.to_string())),
        &mut state,
    )?;
    if let Some(content) = config {
        let ini = Ini::parse(content)?;
        merge(&ini, &mut state, command_line.command, command_line.role)?;
    }
    resolve(
        &mut state,
        command_line.command,
        command_line.role,
        command_line.help,
    )
}

#[track_caller]
fn run_ok(strings: &[&str], config: Option<&str>) -> (Vec<ConfigOption>, Vec<ConfigOptionGroup>) {
    run(strings, config).unwrap()
}

fn value<'a>(options: &'a [ConfigOption], option: OptionId, index: usize) -> Option<&'a Value> {
    options[option as usize].index[index].value.as_ref()
}

#[test]
fn test_sparse_keys_become_a_dense_index_map() {
    let (options, groups) = run_ok(
        &[
            "pgbackrest",
            "--stanza=demo",
            "--pg1-path=/db",
            "--pg3-path=/alt",
            "backup",
        ],
        None,
    );
    let pg = &groups[GroupId::Pg as usize];
    assert!(pg.valid);
    assert_eq!(vec![1, 3], pg.index_map);
    assert_eq!(2, pg.index_total);
    assert_eq!(
        Some(&Value::String("/db".to_string())),
        value(&options, OptionId::PgPath, 0)
    );
    assert_eq!(
        Some(&Value::String("/alt".to_string())),
        value(&options, OptionId::PgPath, 1)
    );
    // The sibling options materialise at every index in use.
    assert_eq!(2, options[OptionId::PgPort as usize].index.len());
    assert_eq!(
        Some(&Value::Integer(5432)),
        value(&options, OptionId::PgPort, 1)
    );
}

#[test]
fn test_empty_groups_keep_one_default_index() {
    let (options, groups) = run_ok(&["pgbackrest", "--stanza=demo", "backup"], None);
    assert_eq!(vec![1], groups[GroupId::Pg as usize].index_map);
    assert_eq!(vec![0], groups[GroupId::Repo as usize].index_map);
    assert!(groups[GroupId::Pg as usize].index_default_exists);
    assert!(groups[GroupId::Repo as usize].index_default_exists);
    // Defaults still materialise into the single default index.
    assert_eq!(
        Some(&Value::String("/var/lib/pgbackrest".to_string())),
        value(&options, OptionId::RepoPath, 0)
    );
    assert_eq!(
        Source::Default,
        options[OptionId::RepoPath as usize].index[0].source
    );
    // pg-path has no default and is not required for backup.
    assert_eq!(None, value(&options, OptionId::PgPath, 0));
}

#[test]
fn test_group_default_selection() {
    let (_, groups) = run_ok(
        &[
            "pgbackrest",
            "--stanza=demo",
            "--repo2-path=/r2",
            "--repo4-path=/r4",
            "--repo=4",
            "backup",
        ],
        None,
    );
    let repo = &groups[GroupId::Repo as usize];
    assert_eq!(vec![1, 3], repo.index_map);
    assert_eq!(1, repo.index_default);
    assert!(repo.index_default_exists);

    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "key '1' is not valid for 'repo' option".to_string()
        )),
        run(
            &[
                "pgbackrest",
                "--stanza=demo",
                "--repo2-path=/r2",
                "--repo=1",
                "backup",
            ],
            None,
        )
    );
    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "'abc' is not valid for 'repo' option".to_string()
        )),
        run(
            &["pgbackrest", "--stanza=demo", "--repo=abc", "backup"],
            None,
        )
    );
    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "key '0' is not valid for 'repo' option".to_string()
        )),
        run(&["pgbackrest", "--stanza=demo", "--repo=0", "backup"], None),
    );
}

#[test]
fn test_reset_removes_a_key_from_the_group() {
    let (_, groups) = run_ok(
        &["pgbackrest", "--stanza=demo", "--reset-pg2-port", "backup"],
        Some("[demo]\npg2-port=5433\n"),
    );
    // The only pg key in play was reset, so the default index remains.
    assert_eq!(vec![1], groups[GroupId::Pg as usize].index_map);
}

#[test]
fn test_depend_unsatisfied_from_argv_is_fatal() {
    assert_eq!(
        Err(ParseError::OptionInvalid(
            "option 'repo1-s3-bucket' not valid without option 'repo1-type' = 's3'".to_string()
        )),
        run(
            &[
                "pgbackrest",
                "--stanza=demo",
                "--repo1-s3-bucket=my-bucket",
                "backup",
            ],
            None,
        )
    );
    assert_eq!(
        Err(ParseError::OptionInvalid(
            "option 'spool-path' not valid without option 'archive-async'".to_string()
        )),
        run(
            &["pgbackrest", "--stanza=demo", "--spool-path=/spool", "archive-get"],
            None,
        )
    );
}

#[test]
fn test_depend_unsatisfied_from_config_is_dropped() {
    let (options, _) = run_ok(
        &["pgbackrest", "--stanza=demo", "backup"],
        Some("[global]\nrepo1-s3-bucket=my-bucket\n"),
    );
    assert_eq!(None, value(&options, OptionId::RepoS3Bucket, 0));
}

#[test]
fn test_depend_satisfied() {
    let (options, _) = run_ok(
        &[
            "pgbackrest",
            "--stanza=demo",
            "--repo1-type=s3",
            "--repo1-s3-bucket=my-bucket",
            "backup",
        ],
        None,
    );
    assert_eq!(
        Some(&Value::String("my-bucket".to_string())),
        value(&options, OptionId::RepoS3Bucket, 0)
    );

    let (options, _) = run_ok(
        &[
            "pgbackrest",
            "--stanza=demo",
            "--archive-async",
            "--spool-path=/spool",
            "archive-get",
        ],
        None,
    );
    assert_eq!(
        Some(&Value::String("/spool".to_string())),
        value(&options, OptionId::SpoolPath, 0)
    );
}

#[test]
fn test_depend_allow_list_message_joins_candidates() {
    assert_eq!(
        Err(ParseError::OptionInvalid(
            "option 'target' not valid without option 'type' in ('lsn', 'name', 'time', 'xid')"
                .to_string()
        )),
        run(
            &[
                "pgbackrest",
                "--stanza=demo",
                "--pg1-path=/db",
                "--target=tag",
                "restore",
            ],
            None,
        )
    );
}

#[test]
fn test_required_options() {
    assert_eq!(
        Err(ParseError::OptionRequired(
            "backup command requires option: stanza".to_string()
        )),
        run(&["pgbackrest", "backup"], None)
    );
    // Stanza-section options get the hint.
    assert_eq!(
        Err(ParseError::OptionRequired(
            "check command requires option: pg1-path\nHINT: does this stanza exist?".to_string()
        )),
        run(&["pgbackrest", "--stanza=demo", "check"], None)
    );
    // Commands with a scoped Required(false) parse without a stanza.
    assert!(run(&["pgbackrest", "info"], None).is_ok());
}

#[test]
fn test_invalid_for_command() {
    assert_eq!(
        Err(ParseError::OptionInvalid(
            "option 'output' not valid for command 'backup'".to_string()
        )),
        run(
            &["pgbackrest", "--stanza=demo", "--output=json", "backup"],
            None,
        )
    );
}

#[test]
fn test_type_parsing_and_checks() {
    let (options, _) = run_ok(
        &[
            "pgbackrest",
            "--stanza=demo",
            "--buffer-size=64kb",
            "--db-timeout=2.5",
            "--process-max=4",
            "--no-online",
            "backup",
        ],
        None,
    );
    assert_eq!(
        Some(&Value::Integer(65_536)),
        value(&options, OptionId::BufferSize, 0)
    );
    assert_eq!(
        Some(&Value::Integer(2500)),
        value(&options, OptionId::DbTimeout, 0)
    );
    assert_eq!(
        Some(&Value::Integer(4)),
        value(&options, OptionId::ProcessMax, 0)
    );
    assert_eq!(Some(&Value::Bool(false)), value(&options, OptionId::Online, 0));
    let online = &options[OptionId::Online as usize].index[0];
    assert!(online.negate);
    assert_eq!(Source::Param, online.source);

    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "'7kb' is out of range for 'buffer-size' option".to_string()
        )),
        run(
            &["pgbackrest", "--stanza=demo", "--buffer-size=7kb", "backup"],
            None,
        )
    );
    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "'bogus' is not valid for 'buffer-size' option".to_string()
        )),
        run(
            &["pgbackrest", "--stanza=demo", "--buffer-size=bogus", "backup"],
            None,
        )
    );
    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "'fast' is not allowed for 'compress-type' option".to_string()
        )),
        run(
            &["pgbackrest", "--stanza=demo", "--compress-type=fast", "backup"],
            None,
        )
    );
    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "'db' must begin with '/' for 'pg1-path' option".to_string()
        )),
        run(
            &["pgbackrest", "--stanza=demo", "--pg1-path=db", "backup"],
            None,
        )
    );
    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "'/db//x' cannot contain '//' for 'pg1-path' option".to_string()
        )),
        run(
            &["pgbackrest", "--stanza=demo", "--pg1-path=/db//x", "backup"],
            None,
        )
    );
}

#[test]
fn test_path_values_are_normalised() {
    let (options, _) = run_ok(
        &["pgbackrest", "--stanza=demo", "--pg1-path=/db/", "backup"],
        None,
    );
    assert_eq!(
        Some(&Value::String("/db".to_string())),
        value(&options, OptionId::PgPath, 0)
    );
}

#[test]
fn test_hash_options() {
    let (options, _) = run_ok(
        &[
            "pgbackrest",
            "--stanza=demo",
            "--pg1-path=/db",
            "--recovery-option=primary_conninfo=host=repo1",
            "--recovery-option",
            "recovery_target_timeline=latest",
            "--recovery-option=primary_conninfo=host=repo2",
            "restore",
        ],
        None,
    );
    // Duplicate keys: last assignment wins.
    assert_eq!(
        Some(&Value::Hash(btreemap! {
            "primary_conninfo".to_string() => "host=repo2".to_string(),
            "recovery_target_timeline".to_string() => "latest".to_string(),
        })),
        value(&options, OptionId::RecoveryOption, 0)
    );

    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "key/value 'no-equals' not valid for 'recovery-option' option".to_string()
        )),
        run(
            &[
                "pgbackrest",
                "--stanza=demo",
                "--pg1-path=/db",
                "--recovery-option=no-equals",
                "restore",
            ],
            None,
        )
    );
}

#[test]
fn test_list_options() {
    let (options, _) = run_ok(
        &[
            "pgbackrest",
            "--stanza=demo",
            "--pg1-path=/db",
            "--db-include=db1",
            "--db-include=db2",
            "restore",
        ],
        None,
    );
    assert_eq!(
        Some(&Value::List(vec!["db1".to_string(), "db2".to_string()])),
        value(&options, OptionId::DbInclude, 0)
    );
}

#[test]
fn test_negated_config_keeps_provenance() {
    let (options, _) = run_ok(&["pgbackrest", "--stanza=demo", "--no-config", "backup"], None);
    let slot = &options[OptionId::Config as usize].index[0];
    assert_eq!(None, slot.value);
    assert!(slot.negate);
    assert_eq!(Source::Param, slot.source);
}

#[test]
fn test_reset_applies_the_default() {
    let (options, _) = run_ok(
        &["pgbackrest", "--stanza=demo", "--reset-compress-type", "backup"],
        Some("[global]\ncompress-type=lz4\n"),
    );
    let slot = &options[OptionId::CompressType as usize].index[0];
    assert_eq!(Some(Value::String("gz".to_string())), slot.value);
    assert!(slot.reset);
    assert_eq!(Source::Param, slot.source);
}

#[test]
fn test_command_scoped_defaults() {
    let (options, _) = run_ok(&["pgbackrest", "--stanza=demo", "backup"], None);
    assert_eq!(
        Some(&Value::String("incr".to_string())),
        value(&options, OptionId::Type, 0)
    );

    let (options, _) = run_ok(
        &["pgbackrest", "--stanza=demo", "--pg1-path=/db", "restore"],
        None,
    );
    assert_eq!(
        Some(&Value::String("default".to_string())),
        value(&options, OptionId::Type, 0)
    );
}

#[test]
fn test_invalid_options_leave_empty_slots() {
    let (options, _) = run_ok(&["pgbackrest", "--stanza=demo", "backup"], None);
    let output = &options[OptionId::Output as usize];
    assert!(!output.valid);
    assert!(output.index.is_empty());
}
