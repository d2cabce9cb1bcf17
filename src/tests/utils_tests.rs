//! Тесты утилит подготовки логов и JSON выгрузки

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::fs;

    use crate::parser::{CleaningStats, clean_line, clean_lines, merge_lines, split_by_events};
    use crate::report::write_json;

    const A: &str = "[2024-08-05T09:24:00.000+03:00]: LTF|event_a|1|o:1|h:2|l:0.5|c:1.5|p2-0,ef2--7.19";
    const B: &str = "[2024-08-05T09:25:00.000+03:00]: LTF|event_a|2|o:1|h:2|l:0.5|c:1.5|p2-0,as2-3.3";
    const C: &str = "[2024-08-05T09:26:00.000+03:00]: LTF|event_b|1|o:1|h:2|l:0.5|c:1.5|p2-0,vc2-11";

    #[test]
    fn test_clean_line_keeps_signs() {
        assert_eq!(
            clean_line("[2024-08-05T09:24:00.000+03:00]:   LTF | event_a |  p2-0,ef2--7.19,ze2--1.5"),
            "[2024-08-05T09:24:00.000+03:00]: LTF|event_a|p2-0,ef2--7.19,ze2--1.5"
        );
    }

    #[test]
    fn test_clean_lines_stats() {
        let content = format!("{A}\n\n{A}\nnot a log line\n  {B}  \n# comment\n");
        let (lines, stats) = clean_lines(&content);

        assert_eq!(lines, vec![A.to_string(), B.to_string()]);
        assert_eq!(
            stats,
            CleaningStats {
                total_lines: 6,
                valid_lines: 2,
                cleaned_lines: 2,
                removed_duplicates: 1,
            }
        );
    }

    #[test]
    fn test_split_by_event_tag() {
        let htf = "[2024-08-05T09:25:30.000+03:00]: HTF|md1h-47%";
        let content = format!("orphan line\n{A}\n{htf}\n{B}\n{C}\n{A}\n");

        let groups = split_by_events(&content).unwrap();
        let names: Vec<&str> = groups.iter().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["event_a", "event_b", "event_a"]);
        // HTF строка без тега остаётся в текущем событии
        assert_eq!(groups[0].1, vec![A.to_string(), htf.to_string(), B.to_string()]);
        assert_eq!(groups[1].1, vec![C.to_string()]);
    }

    #[test]
    fn test_merge_sorts_and_dedups() {
        let first = format!("{C}\n{A}\n");
        let second = format!("{B}\n{A}\nno timestamp\n");

        let (lines, stats) = merge_lines(&[first, second]).unwrap();
        assert_eq!(
            lines,
            vec!["no timestamp".to_string(), A.to_string(), B.to_string(), C.to_string()]
        );
        assert_eq!(stats.total_lines, 5);
        assert_eq!(stats.unique_lines, 4);
        assert_eq!(stats.removed_duplicates, 1);
    }

    #[test]
    fn test_write_json_is_complete_on_return() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("values.json");
        let values: BTreeMap<String, Vec<f64>> =
            (0..500).map(|i| (format!("field_{i}"), vec![i as f64; 20])).collect();

        write_json(&path, &values).unwrap();
        let loaded: BTreeMap<String, Vec<f64>> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(loaded, values);
    }
}
