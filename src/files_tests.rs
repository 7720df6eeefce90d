// Copyright 2025 Pants project contributors (see CONTRIBUTORS.md).
// Licensed under the Apache License, Version 2.0 (see LICENSE).

use std::fs;

use tempfile::TempDir;

use crate::args::{Args, parse_args};
use crate::error::ParseError;
use crate::files::{load, merge};
use crate::ini::Ini;
use crate::rules::{CommandId, CommandRole, OptionId};
use crate::state::{ParseSource, ParseState};
use crate::storage::LocalStorage;

fn state_for(strings: &[&str]) -> ParseState {
    let mut state = ParseState::new();
    parse_args(
        &Args::new(strings.iter().map(|s| s.to_string())),
        &mut state,
    )
    .unwrap();
    state
}

fn write(dir: &TempDir, name: &str, content: &str) -> String {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path.to_str().unwrap().to_string()
}

fn config_path_arg(dir: &TempDir) -> String {
    format!("--config-path={}", dir.path().display())
}

#[test]
fn test_load_nothing() {
    let dir = TempDir::new().unwrap();
    let state = state_for(&["pgbackrest", &config_path_arg(&dir), "--stanza=demo", "backup"]);
    assert_eq!(Ok(None), load(&LocalStorage, &state));
}

#[test]
fn test_load_main_file_from_config_path_default() {
    let dir = TempDir::new().unwrap();
    write(&dir, "pgbackrest.conf", "[global]\ncompress-type=gz\n");
    let state = state_for(&["pgbackrest", &config_path_arg(&dir), "--stanza=demo", "backup"]);
    let ini = load(&LocalStorage, &state).unwrap().unwrap();
    assert!(ini.section("global").is_some());
}

#[test]
fn test_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "custom.conf", "[global]\ncompress-type=gz\n");
    let state = state_for(&[
        "pgbackrest",
        &format!("--config={path}"),
        "--stanza=demo",
        "backup",
    ]);
    assert!(load(&LocalStorage, &state).unwrap().is_some());

    // A user-named file that does not exist is fatal.
    let state = state_for(&[
        "pgbackrest",
        "--config=/nonexistent/custom.conf",
        "--stanza=demo",
        "backup",
    ]);
    assert_eq!(
        Err(ParseError::FileMissing(
            "unable to open missing configuration file '/nonexistent/custom.conf'".to_string()
        )),
        load(&LocalStorage, &state)
    );
}

#[test]
fn test_no_config_still_loads_includes() {
    let dir = TempDir::new().unwrap();
    write(&dir, "pgbackrest.conf", "[global]\ncompress-type=none\n");
    fs::create_dir(dir.path().join("conf.d")).unwrap();
    write(&dir, "conf.d/extra.conf", "[global]\ncompress-type=lz4\n");

    let state = state_for(&[
        "pgbackrest",
        "--no-config",
        &config_path_arg(&dir),
        "--stanza=demo",
        "backup",
    ]);
    let ini = load(&LocalStorage, &state).unwrap().unwrap();
    // The include landed but the main file was skipped, so the include's
    // value is the only definition of the key.
    let mut state = state_for(&["pgbackrest", "--stanza=demo", "backup"]);
    merge(&ini, &mut state, CommandId::Backup, CommandRole::Default).unwrap();
    assert_eq!(
        vec!["lz4".to_string()],
        state.get(OptionId::CompressType, 0).unwrap().values
    );
}

#[test]
fn test_include_directory_merges_with_main() {
    let dir = TempDir::new().unwrap();
    write(&dir, "pgbackrest.conf", "[global]\nprocess-max=4\n");
    fs::create_dir(dir.path().join("conf.d")).unwrap();
    write(&dir, "conf.d/a.conf", "[global]\ncompress-type=lz4\n");
    write(&dir, "conf.d/b.conf", "[demo]\npg1-path=/db\n");
    // Entries not matching .+\.conf$ are ignored, even unparseable ones.
    write(&dir, "conf.d/notes.txt", "not an ini file at all");
    fs::create_dir(dir.path().join("conf.d/sub.conf")).unwrap();

    let state = state_for(&["pgbackrest", &config_path_arg(&dir), "--stanza=demo", "backup"]);
    let ini = load(&LocalStorage, &state).unwrap().unwrap();
    assert!(ini.section("global").is_some());
    assert!(ini.section("demo").is_some());
}

#[test]
fn test_duplicate_keys_across_concatenated_parts() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("conf.d")).unwrap();
    write(&dir, "conf.d/a.conf", "[global]\nprocess-max=4\n");
    write(&dir, "conf.d/b.conf", "[global]\nprocess-max=8\n");
    let state = state_for(&["pgbackrest", &config_path_arg(&dir), "--stanza=demo", "backup"]);
    assert!(matches!(
        load(&LocalStorage, &state),
        Err(ParseError::Format(message)) if message.contains("duplicated")
    ));
}

#[test]
fn test_user_include_path_must_exist() {
    let dir = TempDir::new().unwrap();
    let missing = format!("{}/nodir", dir.path().display());
    let state = state_for(&[
        "pgbackrest",
        &format!("--config-include-path={missing}"),
        "--stanza=demo",
        "backup",
    ]);
    assert_eq!(
        Err(ParseError::FileMissing(format!(
            "unable to list missing configuration include path '{missing}'"
        ))),
        load(&LocalStorage, &state)
    );
}

#[test]
fn test_config_path_reenables_includes_beside_explicit_config() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "custom.conf", "[global]\nprocess-max=4\n");
    fs::create_dir(dir.path().join("conf.d")).unwrap();
    write(&dir, "conf.d/a.conf", "[global]\ncompress-type=lz4\n");

    let state = state_for(&[
        "pgbackrest",
        &format!("--config={path}"),
        &config_path_arg(&dir),
        "--stanza=demo",
        "backup",
    ]);
    let ini = load(&LocalStorage, &state).unwrap().unwrap();
    let section = ini.section("global").unwrap();
    assert_eq!(2, section.pairs.len());
}

#[test]
fn test_unparseable_part_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "custom.conf", "process-max=4\n");
    let state = state_for(&[
        "pgbackrest",
        &format!("--config={path}"),
        "--stanza=demo",
        "backup",
    ]);
    assert!(matches!(
        load(&LocalStorage, &state),
        Err(ParseError::Format(message)) if message.contains(&path)
    ));
}

#[track_caller]
fn merge_for(strings: &[&str], content: &str) -> Result<ParseState, ParseError> {
    let mut state = state_for(strings);
    let ini = Ini::parse(content)?;
    merge(&ini, &mut state, CommandId::Backup, CommandRole::Default)?;
    Ok(state)
}

#[test]
fn test_section_search_order() {
    let state = merge_for(
        &["pgbackrest", "--stanza=demo", "backup"],
        "[global]\ncompress-type=none\n\
         [global:backup]\ncompress-type=bz2\n\
         [demo]\ncompress-type=lz4\n\
         [demo:backup]\ncompress-type=zst\n",
    )
    .unwrap();
    let value = state.get(OptionId::CompressType, 0).unwrap();
    assert_eq!(ParseSource::Config, value.source);
    assert_eq!(vec!["zst".to_string()], value.values);
}

#[test]
fn test_config_never_overrides_higher_sources() {
    let state = merge_for(
        &["pgbackrest", "--stanza=demo", "--compress-type=none", "backup"],
        "[global]\ncompress-type=gz\n",
    )
    .unwrap();
    let value = state.get(OptionId::CompressType, 0).unwrap();
    assert_eq!(ParseSource::Param, value.source);
    assert_eq!(vec!["none".to_string()], value.values);
}

#[test]
fn test_duplicate_aliases_in_one_section() {
    assert_eq!(
        Err(ParseError::OptionInvalid(
            "configuration file contains duplicate options ('pg1-path', 'db-path') \
             in section '[global]'"
                .to_string()
        )),
        merge_for(
            &["pgbackrest", "--stanza=demo", "backup"],
            "[global]\npg1-path=/a\ndb-path=/a\n",
        )
    );
}

#[test]
fn test_skipped_config_entries() {
    let state = merge_for(
        &["pgbackrest", "--stanza=demo", "backup"],
        "[global]\n\
         bogus=1\n\
         no-delta=y\n\
         reset-compress-type=y\n\
         config=/etc/other.conf\n\
         pg1-path=/a\n\
         output=json\n\
         [global:backup]\noutput=text\n",
    )
    .unwrap();
    assert!(state.get(OptionId::Delta, 0).is_none());
    assert!(state.get(OptionId::CompressType, 0).is_none());
    assert!(state.get(OptionId::Config, 0).is_none());
    // Stanza-only options cannot come from global sections.
    assert!(state.get(OptionId::PgPath, 1).is_none());
    // Not valid for backup: silently dropped from plain sections, warned and
    // dropped from command-scoped ones.
    assert!(state.get(OptionId::Output, 0).is_none());
}

#[test]
fn test_stanza_section_entries() {
    let state = merge_for(
        &["pgbackrest", "--stanza=demo", "backup"],
        "[demo]\npg1-path=/db\npg2-port=5433\n",
    )
    .unwrap();
    assert_eq!(
        vec!["/db".to_string()],
        state.get(OptionId::PgPath, 1).unwrap().values
    );
    assert_eq!(
        vec!["5433".to_string()],
        state.get(OptionId::PgPort, 2).unwrap().values
    );
}

#[test]
fn test_stanza_sections_ignored_without_stanza() {
    let state = merge_for(&["pgbackrest", "backup"], "[demo]\npg1-path=/db\n").unwrap();
    assert!(state.get(OptionId::PgPath, 1).is_none());
}

#[test]
fn test_boolean_and_empty_values() {
    let state = merge_for(
        &["pgbackrest", "--stanza=demo", "backup"],
        "[global]\ndelta=n\n",
    )
    .unwrap();
    assert!(state.get(OptionId::Delta, 0).unwrap().negate);

    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "boolean option 'delta' must be 'y' or 'n'".to_string()
        )),
        merge_for(
            &["pgbackrest", "--stanza=demo", "backup"],
            "[global]\ndelta=true\n",
        )
    );
    assert_eq!(
        Err(ParseError::OptionInvalidValue(
            "option 'compress-type' must have a value".to_string()
        )),
        merge_for(
            &["pgbackrest", "--stanza=demo", "backup"],
            "[global]\ncompress-type=\n",
        )
    );
}

#[test]
fn test_list_values_require_multi() {
    let state = merge_for(
        &["pgbackrest", "--stanza=demo", "backup"],
        "[global]\nexclude[]=a\nexclude[]=b\n",
    )
    .unwrap();
    assert_eq!(
        vec!["a".to_string(), "b".to_string()],
        state.get(OptionId::Exclude, 0).unwrap().values
    );

    assert_eq!(
        Err(ParseError::OptionInvalid(
            "option 'stanza' cannot be set multiple times".to_string()
        )),
        merge_for(
            &["pgbackrest", "backup"],
            "[global]\nstanza[]=a\nstanza[]=b\n",
        )
    );
}
