/* ==================================================================================================
 *                           This file is part of the bachelor thesis project
 *                  Implementation and Analysis of Selected Noise Reduction Methods
 *                           Evaluation and Ranking of Candidate Outputs
 *                                  University of Wrocław, June 2025
 * ================================================================================================== */
use crate::error::{EvalError, Result};
use crate::ranking::{CandidateTable, RankingResult};
use csv::Writer;
use std::fmt::Write as _;
use std::io;

/// Column names of a ranking CSV (after the optional leading `case` column).
pub const CSV_HEADER: [&str; 8] =
    ["rank", "method", "score", "snr_db", "mse", "correlation", "pesq_proxy", "stoi_proxy"];

/// Write the header row, optionally prefixed by a `case` column.
pub fn write_csv_header<W: io::Write>(csv_writer: &mut Writer<W>, with_case: bool) -> Result<()> {
    if with_case {
        csv_writer.write_field("case")?;
    }
    csv_writer.write_record(CSV_HEADER)?;
    Ok(())
}

/// Append one row per ranked candidate with its raw metrics.
///
/// # Arguments
/// * `csv_writer` - Destination, header already written.
/// * `case`       - Value of the leading `case` column, or `None` when the header has no such column.
/// * `table`      - Raw metrics of every candidate.
/// * `result`     - Ranking computed from `table`.
pub fn write_csv_rows<W: io::Write>(
    csv_writer: &mut Writer<W>,
    case: Option<&str>,
    table: &CandidateTable,
    result: &RankingResult,
) -> Result<()> {
    for (place, candidate) in result.ranking().iter().enumerate() {
        let m = table
            .get(&candidate.name)
            .ok_or_else(|| EvalError::Config(format!("ranked candidate '{}' missing from table", candidate.name)))?;
        if let Some(case) = case {
            csv_writer.write_field(case)?;
        }
        csv_writer.write_record(&[
            (place + 1).to_string(),
            candidate.name.clone(),
            candidate.score.to_string(),
            m.snr_db.to_string(),
            m.mse.to_string(),
            m.correlation.to_string(),
            m.pesq_proxy.to_string(),
            m.stoi_proxy.to_string(),
        ])?;
    }
    Ok(())
}

/// Text of a finished in-memory CSV buffer
fn into_text(bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| EvalError::Io(io::Error::new(io::ErrorKind::InvalidData, e)))
}

/// Render a ranking as a complete CSV document.
pub fn ranking_csv(table: &CandidateTable, result: &RankingResult) -> Result<String> {
    let mut csv_writer = Writer::from_writer(Vec::new());
    write_csv_header(&mut csv_writer, false)?;
    write_csv_rows(&mut csv_writer, None, table, result)?;
    let bytes = csv_writer
        .into_inner()
        .map_err(|e| EvalError::Io(io::Error::other(e.to_string())))?;
    into_text(bytes)
}

/// Serialize a ranking (scores, normalized table and weights) as pretty JSON.
pub fn ranking_json(result: &RankingResult) -> Result<String> {
    Ok(serde_json::to_string_pretty(result)?)
}

/// Human-readable table for the terminal.
pub fn ranking_table(table: &CandidateTable, result: &RankingResult) -> String {
    let width = result.ranking().iter().map(|c| c.name.len()).max().unwrap_or(0).max("method".len());
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>4}  {:<width$}  {:>7}  {:>9}  {:>10}  {:>7}  {:>5}  {:>5}",
        "rank", "method", "score", "snr_db", "mse", "corr", "pesq", "stoi"
    );
    for (place, c) in result.ranking().iter().enumerate() {
        if let Some(m) = table.get(&c.name) {
            let _ = writeln!(
                out,
                "{:>4}  {:<width$}  {:>7.4}  {:>9.2}  {:>10.3e}  {:>7.4}  {:>5.2}  {:>5.2}",
                place + 1,
                c.name,
                c.score,
                m.snr_db,
                m.mse,
                m.correlation,
                m.pesq_proxy,
                m.stoi_proxy
            );
        }
    }
    let _ = writeln!(out, "winner: {}", result.winner().name);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{pesq_proxy, stoi_proxy, MetricVector};
    use crate::ranking::{rank, Weights};

    fn sample() -> (CandidateTable, RankingResult) {
        let mut table = CandidateTable::new();
        for (name, snr, mse, corr) in [("wiener", 9.0, 0.1, 0.8), ("kalman", 2.0, 0.4, 0.3)] {
            let m = MetricVector {
                snr_db: snr,
                mse,
                correlation: corr,
                pesq_proxy: pesq_proxy(corr),
                stoi_proxy: stoi_proxy(corr),
            };
            table.insert(name, m).unwrap();
        }
        let result = rank(&table, &Weights::default()).unwrap();
        (table, result)
    }

    #[test]
    fn test_csv_layout() {
        let (table, result) = sample();
        let text = ranking_csv(&table, &result).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "rank,method,score,snr_db,mse,correlation,pesq_proxy,stoi_proxy");
        assert!(lines[1].starts_with("1,wiener,"));
        assert!(lines[2].starts_with("2,kalman,"));
    }

    #[test]
    fn test_csv_with_case_column() {
        let (table, result) = sample();
        let mut csv_writer = Writer::from_writer(Vec::new());
        write_csv_header(&mut csv_writer, true).unwrap();
        write_csv_rows(&mut csv_writer, Some("street"), &table, &result).unwrap();
        let text = String::from_utf8(csv_writer.into_inner().unwrap()).unwrap();
        assert!(text.starts_with("case,rank,method"));
        assert!(text.lines().skip(1).all(|l| l.starts_with("street,")));
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        assert_eq!(into_text(b"rank,method".to_vec()).unwrap(), "rank,method");
        match into_text(vec![b'a', 0xff, 0xfe]) {
            Err(EvalError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::InvalidData),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_json_contains_normalized_table() {
        let (_, result) = sample();
        let value: serde_json::Value = serde_json::from_str(&ranking_json(&result).unwrap()).unwrap();
        assert_eq!(value["ranking"][0]["name"], "wiener");
        assert_eq!(value["weights"]["mse"], 0.15);
        assert_eq!(value["normalized"]["wiener"]["snr_db"].as_f64().map(|v| v > 0.99), Some(true));
    }

    #[test]
    fn test_text_table_names_winner() {
        let (table, result) = sample();
        let text = ranking_table(&table, &result);
        assert!(text.ends_with("winner: wiener\n"));
        assert_eq!(text.lines().count(), 4);
    }
}
