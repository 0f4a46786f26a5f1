use super::*;

#[test]
fn defaults_are_valid() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.to_string(), "127.0.0.1:3000");
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
    assert!(settings.database.url.is_none());
    assert_eq!(settings.database.max_connections.get(), 4);
    assert_eq!(settings.database.table_prefix, "wp_");
    assert_eq!(settings.forum.site_url, "http://localhost/");
    assert_eq!(settings.forum.posts_per_page.get(), 10);
    assert_eq!(settings.forum.timezone, Tz::UTC);
    assert!(settings.forum.pretty_permalinks);
    assert!(settings.sitemap.cache_enabled);
    assert_eq!(settings.sitemap.cache_ttl, Duration::from_secs(3600));
    assert_eq!(
        settings.sitemap.endpoint_path(),
        "/wp-json/asgaros/v1/forum-sitemap"
    );
    assert_eq!(settings.sitemap.virtual_path, "/forum-sitemap.xml");
    assert_eq!(settings.sitemap.query_var, "forum_sitemap");
    assert_eq!(settings.sitemap.availability_recheck, Duration::from_secs(30));
}

#[test]
fn zero_availability_recheck_is_allowed() {
    let mut raw = RawSettings::default();
    raw.sitemap.availability_recheck_seconds = Some(0);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.sitemap.availability_recheck, Duration::ZERO);
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn blank_database_url_is_treated_as_missing() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn table_prefix_rejects_sql_metacharacters() {
    let mut raw = RawSettings::default();
    raw.database.table_prefix = Some("wp_`; DROP".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "database.table_prefix",
            ..
        }
    ));
}

#[test]
fn unknown_timezone_is_rejected() {
    let mut raw = RawSettings::default();
    raw.forum.timezone = Some("Mars/Olympus".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "forum.timezone", .. }));
}

#[test]
fn named_timezone_is_parsed() {
    let mut raw = RawSettings::default();
    raw.forum.timezone = Some("Europe/Berlin".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.forum.timezone, chrono_tz::Europe::Berlin);
}

#[test]
fn zero_ttl_and_zero_page_size_are_rejected() {
    let mut raw = RawSettings::default();
    raw.sitemap.cache_ttl_seconds = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = RawSettings::default();
    raw.forum.posts_per_page = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn namespace_slashes_are_trimmed() {
    let mut raw = RawSettings::default();
    raw.sitemap.rest_namespace = Some("/custom/v2/".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.sitemap.endpoint_path(), "/custom/v2/forum-sitemap");
}

#[test]
fn virtual_path_must_be_absolute() {
    let mut raw = RawSettings::default();
    raw.sitemap.virtual_path = Some("forum-sitemap.xml".to_string());
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn invalid_site_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.forum.site_url = Some("not a url".to_string());
    let err = Settings::from_raw(raw).unwrap_err();
    assert!(matches!(err, LoadError::Invalid { key: "forum.site_url", .. }));
}

#[test]
fn forum_options_carry_fallback_inputs() {
    let mut raw = RawSettings::default();
    raw.forum.site_url = Some("https://example.org/".to_string());
    raw.forum.location_url = Some("https://example.org/community/".to_string());
    raw.forum.view_name_topic = Some("thread".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");

    let options = settings.forum.options();
    assert_eq!(options.site_url, "https://example.org/");
    assert_eq!(
        options.location_url.as_deref(),
        Some("https://example.org/community/")
    );
    assert_eq!(options.view_name_forum, "forum");
    assert_eq!(options.view_name_topic, "thread");
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["forum-sitemap"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "forum-sitemap",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "mysql://override",
        "--cache-enabled",
        "false",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database.database_url.as_deref(),
                Some("mysql://override")
            );
            assert_eq!(serve.overrides.cache_enabled, Some(false));
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_generate_arguments() {
    let args = CliArgs::parse_from([
        "forum-sitemap",
        "generate",
        "--database-url",
        "mysql://example",
        "--table-prefix",
        "blog_",
        "/tmp/forum-sitemap.xml",
    ]);

    match args.command.expect("generate command") {
        Command::Generate(generate) => {
            assert_eq!(
                generate.database.database_url.as_deref(),
                Some("mysql://example")
            );
            assert_eq!(generate.database.table_prefix.as_deref(), Some("blog_"));
            assert_eq!(
                generate.output.as_deref(),
                Some(std::path::Path::new("/tmp/forum-sitemap.xml"))
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn generate_overrides_apply_to_database_settings() {
    let mut raw = RawSettings::default();
    let args = GenerateArgs {
        database: DatabaseOverride {
            database_url: Some("mysql://cli".to_string()),
            table_prefix: Some("forum_".to_string()),
        },
        site_url: Some("https://cli.example/".to_string()),
        output: None,
    };

    raw.apply_generate_overrides(&args);
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(settings.database.url.as_deref(), Some("mysql://cli"));
    assert_eq!(settings.database.table_prefix, "forum_");
    assert_eq!(settings.forum.site_url, "https://cli.example/");
}
