use camcast_base::logging::{FileLogger, StdoutLogger, format_record, format_timestamp};
use log::{LevelFilter, Log};
use std::fs;

fn record_at<'a>(level: log::Level, args: std::fmt::Arguments<'a>) -> log::Record<'a> {
    log::RecordBuilder::new()
        .level(level)
        .target("test")
        .file(Some("capture.rs"))
        .line(Some(42))
        .args(args)
        .build()
}

#[test]
fn test_stdout_logger_respects_level() {
    let logger = StdoutLogger::new(LevelFilter::Info);

    let debug = log::MetadataBuilder::new().level(log::Level::Debug).build();
    let warn = log::MetadataBuilder::new().level(log::Level::Warn).build();

    assert!(!logger.enabled(&debug));
    assert!(logger.enabled(&warn));

    logger.log(&record_at(log::Level::Info, format_args!("hello")));
    logger.flush();
}

#[test]
fn test_format_record_layout() {
    let line = format_record(&record_at(log::Level::Warn, format_args!("frame skipped")));

    assert!(line.contains("[WARN]"));
    assert!(line.contains("capture.rs:42"));
    assert!(line.ends_with("- frame skipped"));
}

#[test]
fn test_format_timestamp_layout() {
    let ts = format_timestamp();
    assert_eq!(ts.len(), 19);
    assert_eq!(&ts[4..5], "-");
    assert_eq!(&ts[10..11], "T");
    assert_eq!(&ts[16..17], ":");
}

#[test]
fn test_file_logger_writes_and_filters() {
    let dir = std::env::temp_dir().join(format!("camcast-log-test-{}-write", std::process::id()));
    let _ = fs::remove_dir_all(&dir);

    let logger = FileLogger::new(&dir, LevelFilter::Info).expect("create logger");
    logger.log(&record_at(log::Level::Error, format_args!("device gone")));
    logger.log(&record_at(log::Level::Debug, format_args!("too chatty")));
    logger.flush();

    let entries: Vec<_> = fs::read_dir(&dir).unwrap().collect();
    assert_eq!(entries.len(), 1);

    let content = fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
    assert!(content.contains("device gone"));
    assert!(!content.contains("too chatty"));

    fs::remove_dir_all(&dir).ok();
}
