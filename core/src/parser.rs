//! Readers for the tagged-field collection format (CACM, CISI) and its
//! query / relevance files.
//!
//! ```text
//! .I 12
//! .T
//! A title line
//! .W
//! Body text, possibly
//! over several lines.
//! .X
//! 1410	5	12
//! ```
//!
//! `.I <id>` opens a record, `.<LETTER>` switches field, any other line is
//! appended to the current field. `.X` lines are tab separated and their first
//! column is a cited document id.

use crate::{Collection, DocId, Document, Error, Query, QueryId, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

struct Record {
    id: u32,
    fields: HashMap<char, String>,
    links: Option<Vec<DocId>>,
}

impl Record {
    fn field(&self, tag: char) -> String {
        self.fields
            .get(&tag)
            .map(|s| s.strip_suffix(' ').unwrap_or(s).to_string())
            .unwrap_or_default()
    }
}

fn parse_error(source: &str, line: usize, message: impl Into<String>) -> Error {
    Error::Parse { path: source.to_string(), line, message: message.into() }
}

fn parse_records<R: BufRead>(reader: R, source: &str) -> Result<Vec<Record>> {
    let mut records: Vec<Record> = Vec::new();
    let mut tag = ' ';
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = n + 1;
        if line.is_empty() {
            continue;
        }
        if line.starts_with(".I") {
            let id = line
                .split_whitespace()
                .last()
                .and_then(|tok| tok.parse::<u32>().ok())
                .ok_or_else(|| parse_error(source, lineno, format!("bad record id in {line:?}")))?;
            records.push(Record { id, fields: HashMap::new(), links: None });
            tag = 'I';
            continue;
        }
        let record = records
            .last_mut()
            .ok_or_else(|| parse_error(source, lineno, "content before the first .I record"))?;
        let mut chars = line.chars();
        if let (Some('.'), Some(c), None) = (chars.next(), chars.next(), chars.next()) {
            if c.is_ascii_uppercase() {
                tag = c;
                if tag == 'X' {
                    record.links = Some(Vec::new());
                } else {
                    record.fields.insert(tag, String::new());
                }
                continue;
            }
        }
        if tag == 'X' {
            let cited = line
                .split('\t')
                .next()
                .and_then(|col| col.trim().parse::<DocId>().ok())
                .ok_or_else(|| parse_error(source, lineno, format!("bad citation line {line:?}")))?;
            record.links.get_or_insert_with(Vec::new).push(cited);
        } else {
            let field = record.fields.entry(tag).or_default();
            field.push_str(&line);
            field.push(' ');
        }
    }
    Ok(records)
}

pub fn parse_collection<R: BufRead>(reader: R, source: &str) -> Result<Collection> {
    let mut collection = Collection::new();
    for record in parse_records(reader, source)? {
        let doc = Document {
            id: record.id,
            title: record.field('T'),
            date: record.field('B'),
            author: record.field('A'),
            keywords: record.field('K'),
            text: record.field('W'),
            links: record.links,
        };
        if collection.insert(doc).is_some() {
            tracing::warn!(doc_id = record.id, source, "duplicate document id, keeping the last one");
        }
    }
    tracing::info!(num_docs = collection.len(), source, "collection parsed");
    Ok(collection)
}

pub fn load_collection<P: AsRef<Path>>(path: P) -> Result<Collection> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    parse_collection(reader, &path.display().to_string())
}

/// Reads queries and attaches relevance judgments (`queryId docId _ grade` per line).
/// A missing grade column counts as grade 0.
pub fn parse_queries<Q: BufRead, R: BufRead>(
    queries: Q,
    relevance: R,
    source: &str,
) -> Result<BTreeMap<QueryId, Query>> {
    let mut parsed: BTreeMap<QueryId, Query> = parse_records(queries, source)?
        .into_iter()
        .map(|r| (r.id, Query::new(r.id, r.field('W'))))
        .collect();

    for (n, line) in relevance.lines().enumerate() {
        let line = line?;
        let cols: Vec<&str> = line.split_whitespace().collect();
        if cols.is_empty() {
            continue;
        }
        let bad = || parse_error(source, n + 1, format!("bad relevance line {line:?}"));
        let query_id: QueryId = cols[0].parse().map_err(|_| bad())?;
        let doc_id: DocId = cols.get(1).and_then(|c| c.parse().ok()).ok_or_else(bad)?;
        let grade: f64 = match cols.get(3) {
            Some(c) => c.parse().map_err(|_| bad())?,
            None => 0.0,
        };
        match parsed.get_mut(&query_id) {
            Some(query) => {
                query.relevant.insert(doc_id, grade);
            }
            None => tracing::warn!(query_id, doc_id, "relevance judgment for unknown query"),
        }
    }
    Ok(parsed)
}

pub fn load_queries<P: AsRef<Path>>(qry: P, rel: P) -> Result<BTreeMap<QueryId, Query>> {
    let qry = qry.as_ref();
    let queries = BufReader::new(File::open(qry)?);
    let relevance = BufReader::new(File::open(rel.as_ref())?);
    parse_queries(queries, relevance, &qry.display().to_string())
}
