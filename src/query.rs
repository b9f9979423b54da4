// Copyright 2017-2021 Lukas Pustina <lukas@pustina.de>
//
// Licensed under the Apache License, Version 2.0, <LICENSE-APACHE or
// http://apache.org/licenses/LICENSE-2.0> or the MIT license <LICENSE-MIT or
// http://opensource.org/licenses/MIT>, at your option. This file may not be
// copied, modified, or distributed except according to those terms.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

use hickory_proto::rr::{Name, RecordType};

use crate::{Error, Result};

/// One question to ask the resolver over and over: a domain name plus a
/// record type.
///
/// Domain names are taken as given. Names intended as fully qualified must
/// carry their trailing dot; nothing is normalized on behalf of the
/// operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    name: Name,
    record_type: RecordType,
}

impl Query {
    pub fn new(name: Name, record_type: RecordType) -> Query {
        Query { name, record_type }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }
}

impl FromStr for Query {
    type Err = Error;

    /// Parses one data file line in the format `<domain> <record type>`.
    fn from_str(str: &str) -> Result<Query> {
        let fields: Vec<&str> = str.split_whitespace().collect();
        if fields.len() != 2 {
            return Err(Error::ParserError {
                what: str.to_string(),
                to: "Query",
                why: "expected '<domain> <record type>'".to_string(),
            });
        }

        let name = parse_name(fields[0])?;
        let record_type = RecordType::from_str(&fields[1].to_uppercase()).map_err(|e| Error::ParserError {
            what: fields[1].to_string(),
            to: "RecordType",
            why: e.to_string(),
        })?;

        Ok(Query::new(name, record_type))
    }
}

/// The full, ordered list of questions the engine cycles through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySet {
    queries: Vec<Query>,
}

impl QuerySet {
    /// Creates a query set from plain domain arguments; the record type
    /// defaults to A.
    pub fn from_domains<I, S>(domains: I) -> Result<QuerySet>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let queries: Result<Vec<_>> = domains
            .into_iter()
            .map(|domain| parse_name(domain.as_ref()).map(|name| Query::new(name, RecordType::A)))
            .collect();

        Ok(QuerySet { queries: queries? })
    }

    /// Reads a query set from a line-oriented data file of
    /// `<domain> <record type>` pairs.
    ///
    /// Example:
    /// ```text
    /// www.apple.com.  A
    /// frycomm.com.s9b2.psmtp.com. A
    /// 170.44.153.187.in-addr.arpa.    PTR
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<QuerySet> {
        let file = File::open(path)?;
        QuerySet::from_reader(BufReader::new(file))
    }

    /// Blank lines are skipped; anything else must parse or the whole set
    /// is rejected.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<QuerySet> {
        let mut queries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            queries.push(line.parse()?);
        }

        Ok(QuerySet { queries })
    }

    pub fn queries(&self) -> &[Query] {
        &self.queries
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    /// Splits the query set into `count` partitions of `len / count`
    /// queries each by repeatedly slicing off the front.
    ///
    /// The trailing `len % count` queries are not assigned to any
    /// partition. Callers must keep `count` at or below `len` if every
    /// partition is expected to be non-empty.
    pub fn partition(mut self, count: usize) -> Vec<Vec<Query>> {
        if count == 0 {
            return Vec::new();
        }

        let step = self.queries.len() / count;
        let mut partitions = Vec::with_capacity(count);
        for _ in 0..count {
            let rest = self.queries.split_off(step);
            partitions.push(std::mem::replace(&mut self.queries, rest));
        }

        partitions
    }
}

fn parse_name(domain: &str) -> Result<Name> {
    Name::from_str(domain).map_err(|e| Error::ParserError {
        what: domain.to_string(),
        to: "Name",
        why: e.to_string(),
    })
}
