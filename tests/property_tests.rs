//! Property-based tests for rust_hierarchical_logger using proptest

use proptest::prelude::*;
use rust_hierarchical_logger::prelude::*;

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Trace),
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

fn capture(level: LogLevel) -> (Logger, MemorySink) {
    let sink = MemorySink::new();
    let logger = Logger::builder()
        .level(level)
        .sink(sink.clone())
        .build()
        .unwrap();
    (logger, sink)
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Integer and name conversions roundtrip
    #[test]
    fn test_log_level_roundtrip(level in any_level()) {
        prop_assert_eq!(LogLevel::from_int(level.as_int()).unwrap(), level);
        prop_assert_eq!(LogLevel::from_name(level.as_str()).unwrap(), level);
        prop_assert_eq!(level.as_str().parse::<LogLevel>().unwrap(), level);
        prop_assert_eq!(format!("{}", level), level.as_str());
    }

    /// Ordering follows the canonical integers
    #[test]
    fn test_log_level_ordering(level1 in any_level(), level2 in any_level()) {
        prop_assert_eq!(level1 <= level2, level1.as_int() <= level2.as_int());
        prop_assert_eq!(level1 < level2, level1.as_int() < level2.as_int());
    }

    /// Only the six canonical integers resolve
    #[test]
    fn test_non_canonical_integers_rejected(value in any::<i64>()) {
        let canonical = [10, 20, 30, 40, 50, 60].contains(&value);
        prop_assert_eq!(LogLevel::from_int(value).is_ok(), canonical);
        if !canonical {
            let is_invalid_level = matches!(
                LevelArg::from(value).resolve(),
                Err(LoggerError::InvalidLevel { .. })
            );
            prop_assert!(is_invalid_level);
        }
    }

    /// Unknown names never resolve
    #[test]
    fn test_unknown_names_rejected(name in "[a-z]{1,10}") {
        let known = LogLevel::ALL.iter().any(|l| l.as_str() == name);
        prop_assert_eq!(LogLevel::from_name(&name).is_ok(), known);
    }

    /// Level JSON serialization roundtrips through the lowercase name
    #[test]
    fn test_log_level_json_roundtrip(level in any_level()) {
        let json = serde_json::to_string(&level).unwrap();
        prop_assert_eq!(&json, &format!("\"{}\"", level.as_str()));
        let parsed: LogLevel = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(parsed, level);
    }
}

// ============================================================================
// Filtering Tests
// ============================================================================

proptest! {
    /// A call emits iff its level is at or above the logger's level
    #[test]
    fn test_logger_level_gating(logger_level in any_level(), call_level in any_level()) {
        let (logger, sink) = capture(logger_level);
        logger.log(call_level, "gated");
        prop_assert_eq!(sink.len() == 1, call_level >= logger_level);
    }

    /// A sink receives a record iff it passes both thresholds
    #[test]
    fn test_two_stage_gating(
        logger_level in any_level(),
        sink_level in any_level(),
        call_level in any_level()
    ) {
        let sink = MemorySink::new().with_level(sink_level);
        let logger = Logger::builder()
            .level(logger_level)
            .sink(sink.clone())
            .build()
            .unwrap();

        logger.log(call_level, "gated");
        let expected = call_level >= logger_level && call_level >= sink_level;
        prop_assert_eq!(sink.len() == 1, expected);
    }

    /// set_level reaches every descendant regardless of depth
    #[test]
    fn test_set_level_reaches_all_depths(depth in 1usize..6, level in any_level()) {
        let root = Logger::builder().level(LogLevel::Trace).build().unwrap();
        let mut chain = vec![root.clone()];
        for i in 0..depth {
            let next = chain[i].spawn_child(format!("depth-{}", i));
            chain.push(next);
        }

        root.set_level(level).unwrap();
        for logger in &chain {
            prop_assert_eq!(logger.level(), level);
        }
    }
}

// ============================================================================
// Record Construction Tests
// ============================================================================

proptest! {
    /// Call fields beat contextual fields; untouched context keys survive
    #[test]
    fn test_field_precedence(
        key in "[a-z]{1,8}",
        context_value in any::<i64>(),
        call_value in any::<i64>()
    ) {
        prop_assume!(!["name", "hostname", "pid", "time", "level", "msg"].contains(&key.as_str()));

        let (logger, sink) = capture(LogLevel::Trace);
        logger.assign_fields(fields! { key.as_str() => context_value, "kept" => true });

        logger.info_with_fields("call", fields! { key.as_str() => call_value });
        logger.info("context");

        let records = sink.records();
        prop_assert_eq!(records[0].get(&key), Some(&FieldValue::Int(call_value)));
        prop_assert_eq!(records[1].get(&key), Some(&FieldValue::Int(context_value)));
        prop_assert_eq!(records[0].get("kept"), Some(&FieldValue::Bool(true)));
    }

    /// time, level and msg from the call replace contextual values
    #[test]
    fn test_builtin_fields_override_context(message in ".*", level in any_level()) {
        let (logger, sink) = capture(LogLevel::Trace);
        logger.assign_fields(fields! { "msg" => "stale", "level" => 99 });

        logger.log(level, message.clone());
        let records = sink.records();
        prop_assert_eq!(records[0].msg(), Some(message.as_str()));
        prop_assert_eq!(records[0].level(), Some(level));
    }

    /// Encoded records are always one parseable JSON line
    #[test]
    fn test_json_lines_parse(message in ".*", value in ".*") {
        let (logger, sink) = capture(LogLevel::Trace);
        logger.info_with_fields(message.clone(), fields! { "value" => value.clone() });

        let encoded = Encoder::new().encode_record(&sink.records()[0]).unwrap();
        prop_assert!(!encoded.contains('\n'));

        let parsed: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        prop_assert_eq!(parsed["msg"].as_str(), Some(message.as_str()));
        prop_assert_eq!(parsed["value"].as_str(), Some(value.as_str()));
    }
}
