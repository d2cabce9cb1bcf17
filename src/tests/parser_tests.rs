//! Тесты парсера логов
//! Проверка разбора метаданных свечи, полей LTF/HTF, сигналов и специальных полей

#[cfg(test)]
mod tests {
    use std::fs;

    use crate::features::FeatureSchema;
    use crate::parser::{
        CandleColor, CandleType, FieldTag, FieldValue, LineParser, LogParser, QualityLevel,
        Timeframe, parse_value, parse_volume, validate_log_format,
    };
    use crate::tests::fixtures;

    const SAMPLE: &str = "[2024-08-05T09:24:00.000+03:00]: LTF|event_2025-06-28_22-55|1|2024-08-05 06:24|RED|-1.79%|11.5K|BIG_BODY|66%|-18.8%_24h|o:50254.8|h:50258.6|l:48888|c:49353.4|rng:1370.6|p2-0,p5-80,ef2--7.19,nw2-!!,as2-3.33,vw15--2.47,md1h-47%,cz4h-1.5σ,bs,wa 2";

    fn parser() -> LineParser {
        LineParser::new().expect("patterns compile")
    }

    #[test]
    fn test_parse_value_formats() {
        assert_eq!(parse_value("--7.19").unwrap(), -7.19);
        assert_eq!(parse_value("-7.19").unwrap(), -7.19);
        assert_eq!(parse_value("47%").unwrap(), 47.0);
        assert_eq!(parse_value("1.5σ").unwrap(), 1.5);
        assert!(parse_value("abc").is_err());
    }

    #[test]
    fn test_parse_volume_units() {
        assert_eq!(parse_volume("11.5K").unwrap(), 11.5);
        assert_eq!(parse_volume("1.2M").unwrap(), 1200.0);
        assert_eq!(parse_volume("2500").unwrap(), 2.5);
    }

    #[test]
    fn test_sample_line_candle() {
        let record = parser().parse_line(SAMPLE, 0).expect("line parsed");

        assert_eq!(record.timestamp.as_deref(), Some("2024-08-05T09:24:00.000+03:00"));
        assert_eq!(record.section, Some(Timeframe::Ltf));
        assert_eq!(record.event_tag.as_deref(), Some("event_2025-06-28_22-55"));

        let candle = &record.candle;
        assert_eq!(candle.open, Some(50254.8));
        assert_eq!(candle.high, Some(50258.6));
        assert_eq!(candle.low, Some(48888.0));
        assert_eq!(candle.close, Some(49353.4));
        assert_eq!(candle.range, Some(1370.6));
        assert_eq!(candle.volume, Some(11.5));
        assert_eq!(candle.color, Some(CandleColor::Red));
        assert_eq!(candle.change_pct, Some(-1.79));
        assert_eq!(candle.candle_type, CandleType::BigBody);
        assert_eq!(candle.body_pct, Some(66.0));
        assert_eq!(candle.change_24h, Some(-18.8));
    }

    #[test]
    fn test_sample_line_indicators() {
        let record = parser().parse_line(SAMPLE, 0).expect("line parsed");

        // Двойной минус означает отрицательное значение
        assert_eq!(record.field_number("ef2"), Some(-7.19));
        assert_eq!(record.field_number("as2"), Some(3.33));
        assert_eq!(record.field_number("vw15"), Some(-2.47));
        assert_eq!(record.fields["ef2"].tag, FieldTag::Ltf);

        let nw2 = &record.fields["nw2"].value;
        assert_eq!(nw2.signal(), Some("!!"));
        assert_eq!(nw2.as_number(), Some(2.0));

        assert_eq!(record.field_number("md1h"), Some(47.0));
        assert_eq!(record.field_number("cz4h"), Some(1.5));
        assert_eq!(record.fields["md1h"].tag, FieldTag::Htf);
    }

    #[test]
    fn test_special_and_progress_fields() {
        let record = parser().parse_line(SAMPLE, 0).expect("line parsed");

        assert_eq!(record.fields["bs"].value, FieldValue::Flag);
        assert_eq!(record.fields["bs"].tag, FieldTag::HtfSpecial);
        assert_eq!(record.fields["wa"].value, FieldValue::Number(2.0));

        // progress поля не попадают в индикаторы
        assert!(!record.fields.contains_key("p2"));
        assert_eq!(record.progress["p2"].value, FieldValue::Number(0.0));
        assert_eq!(record.progress["p5"].value, FieldValue::Number(80.0));
        assert_eq!(record.progress["p5"].tag, FieldTag::LtfProgress);
    }

    #[test]
    fn test_prefix_must_match_timeframe() {
        // od допустим только на HTF, vw только на LTF
        let record = parser()
            .parse_line("[t]: LTF|od2-5,vw1h-3,ef5-1.5,od4h-2", 0)
            .expect("line parsed");
        assert!(!record.fields.contains_key("od2"));
        assert!(!record.fields.contains_key("vw1h"));
        assert_eq!(record.field_number("ef5"), Some(1.5));
        assert_eq!(record.field_number("od4h"), Some(2.0));
    }

    #[test]
    fn test_comments_and_empty_lines_skipped() {
        let p = parser();
        assert!(p.parse_line("", 0).is_none());
        assert!(p.parse_line("   ", 1).is_none());
        assert!(p.parse_line("# ef2-5", 2).is_none());
        assert!(p.parse_line("[t]: nothing useful here", 3).is_none());
    }

    #[test]
    fn test_parse_str_dataset() {
        let log_parser = LogParser::new().unwrap();
        let text = format!("# header\n\n{}\ngarbage line\n{}\n", fixtures::log_line(0), fixtures::log_line(1));
        let dataset = log_parser.parse_str(&text).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.total_lines, 5);
        assert_eq!(dataset.skipped_lines, 1);

        let split = dataset.ltf_htf_separation();
        assert!(split.ltf.iter().any(|f| f == "ef2"));
        assert!(split.htf.iter().any(|f| f == "md1h"));
    }

    #[test]
    fn test_parse_str_without_records_fails() {
        let log_parser = LogParser::new().unwrap();
        assert!(log_parser.parse_str("# only comments\n\n").is_err());
    }

    #[test]
    fn test_parsing_quality_with_all_critical_fields() {
        let log_parser = LogParser::new().unwrap();
        let dataset = log_parser.parse_str(&fixtures::synthetic_log(40)).unwrap();

        let quality = dataset.validate_parsing_quality();
        assert!(quality.missing.is_empty(), "missing: {:?}", quality.missing);
        assert_eq!(quality.score, 1.0);
        assert_eq!(quality.level, QualityLevel::Excellent);

        let stats = dataset.parsing_statistics();
        assert_eq!(stats.total_records, 40);
    }

    #[test]
    fn test_field_names_follow_group_order() {
        let log_parser = LogParser::new().unwrap();
        let dataset = log_parser.parse_str(&fixtures::synthetic_log(10)).unwrap();
        let names = dataset.field_names();

        let position = |name: &str| names.iter().position(|n| n == name);
        assert!(position("ef2").is_some());
        assert!(position("ze2").is_some());
        assert!(position("md1h").is_some());
        // group_1 раньше group_4, внутри группы порядок префиксов
        assert!(position("md1h") < position("ef2"));
        assert!(position("ef2") < position("vc2"));
        assert!(position("vc2") < position("ze2"));
        assert!(position("ze2") < position("nw2"));
    }

    #[test]
    fn test_bang_is_signal_only_for_nw() {
        let line = SAMPLE.replace("as2-3.33", "as2-!!").replace("vw15--2.47", "ef5-!");
        let record = parser().parse_line(&line, 0).expect("line parsed");

        assert_eq!(record.fields["as2"].value, FieldValue::Text("!!".to_string()));
        assert_eq!(record.fields["ef5"].value, FieldValue::Text("!".to_string()));
        assert_eq!(record.fields["as2"].value.signal(), None);
        assert_eq!(record.fields["nw2"].value.signal(), Some("!!"));

        let dataset = LogParser::new().unwrap().parse_str(&line).unwrap();
        let schema = FeatureSchema::from_dataset(&dataset);
        assert_eq!(schema.signal_fields, vec!["nw2".to_string()]);
    }

    #[test]
    fn test_format_validation_skips_leading_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("padded.log");
        let text = format!("{}{}\n{}\n", "\n".repeat(150), fixtures::log_line(0), fixtures::log_line(1));
        fs::write(&path, text).unwrap();

        let result = validate_log_format(&path).unwrap();
        assert!(result.correct_format, "errors: {:?}", result.errors);
        assert_eq!(result.valid_lines, 2);
    }
}
