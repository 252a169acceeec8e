// ConfigSynth: Synthesizing Resilient Network Security Configurations
// Copyright (C) 2021  Tibor Schneider
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

//! # Input Loader
//!
//! Reads a [`Scenario`] from the line based input description. The description consists of
//! records, one record per line. Empty lines and lines starting with `#` are ignored, and the
//! values of a record are separated by spaces, commas or tabs. Each record must contain exactly
//! the number of values its section requires.
//!
//! The description is usually split into two files: the policy part (devices, operating systems,
//! diversity scores and services), and the topology part (hosts, routers, links, requirements and
//! sliders). Both are read back to back as one stream, see [`load_files`].
//!
//! ```text
//! nDev
//! MAX_ISOLATION
//! IsoWgt[1..=nDev]
//! MAX_ISO_USABILITY
//! IsoUsa[1..=nDev]
//! DevCost[1..=nDev]
//! nOS
//! nOSFamily
//! <nOSFamily rows, each listing the operating systems of one family>
//! MAX_DIVERSITY
//! <six diversity scores>
//! MAX_DIV_USABILITY
//! OSUsa[1..=nOS]
//! OSCost[1..=nOS]
//! nServ
//! nHost
//! nRouter
//! nLink
//! <nLink rows "a b">
//! <nHost rows of destinations, each terminated by 0>
//! nHighRanks
//! <nHighRanks rows "src dst rank">
//! <nHost rows of services, each terminated by 0>
//! <resiliency slider> <usability slider> <cost budget>
//! ```

use crate::policy::{
    DeviceTable, DeviceType, DiversityTable, FlowPolicy, OperatingSystem, OsTable, PolicyTables,
    ServiceRequirements, Sliders,
};
use crate::scenario::Scenario;
use crate::topology::Topology;
use crate::types::{FamilyId, Flow, NodeId, ServiceId};
use crate::Error;

use log::*;
use std::fmt;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

/// Position of a record in the input
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Name of the source (usually the file name)
    pub source: String,
    /// Line number, starting at 1
    pub line: usize,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.source, self.line)
    }
}

/// Errors while reading the input description
#[derive(Debug, Error)]
pub enum InputError {
    /// Io Error
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),
    /// The input ended before the section was read
    #[error("Unexpected end of input while reading the {section}")]
    UnexpectedEof {
        /// Section that was expected
        section: &'static str,
    },
    /// A record does not have the required number of values
    #[error("{at}: the {section} requires {expected} values, but {found} were given")]
    TokenCount {
        /// Position of the record
        at: Location,
        /// Section of the record
        section: &'static str,
        /// Required number of values
        expected: usize,
        /// Actual number of values
        found: usize,
    },
    /// A record has more values than allowed
    #[error("{at}: the {section} allows at most {max} values, but {found} were given")]
    TooManyTokens {
        /// Position of the record
        at: Location,
        /// Section of the record
        section: &'static str,
        /// Allowed number of values
        max: usize,
        /// Actual number of values
        found: usize,
    },
    /// A value is not an integer
    #[error("{at}: cannot parse {token:?} in the {section} as an integer")]
    ParseInt {
        /// Position of the record
        at: Location,
        /// Section of the record
        section: &'static str,
        /// The offending value
        token: String,
    },
    /// A value is not a finite number
    #[error("{at}: cannot parse {token:?} in the {section} as a finite number")]
    ParseFloat {
        /// Position of the record
        at: Location,
        /// Section of the record
        section: &'static str,
        /// The offending value
        token: String,
    },
    /// An identifier is outside of its valid range
    #[error("{at}: {id} in the {section} is out of range (valid: 1..={max})")]
    IdOutOfRange {
        /// Position of the record
        at: Location,
        /// Section of the record
        section: &'static str,
        /// The offending identifier
        id: i64,
        /// Largest valid identifier
        max: usize,
    },
    /// A value is not allowed at this position (e.g., a negative count)
    #[error("{at}: invalid value {value} in the {section}")]
    InvalidValue {
        /// Position of the record
        at: Location,
        /// Section of the record
        section: &'static str,
        /// The offending value
        value: i64,
    },
    /// A list is not terminated by `0`
    #[error("{at}: the {section} row must be terminated by 0")]
    MissingTerminator {
        /// Position of the record
        at: Location,
        /// Section of the record
        section: &'static str,
    },
    /// Records are left after the sliders
    #[error("{0}: unexpected record after the sliders")]
    TrailingInput(Location),
}

/// Read a scenario from a single string. Error locations use `"input"` as source name.
pub fn parse_input(input: &str) -> Result<Scenario, Error> {
    parse_sources(&[("input", input)])
}

/// Read a scenario from several files, which are concatenated in the given order.
pub fn load_files<P: AsRef<Path>>(files: &[P]) -> Result<Scenario, Error> {
    let mut contents: Vec<(String, String)> = Vec::with_capacity(files.len());
    for f in files {
        let name = f.as_ref().display().to_string();
        debug!("Reading input file {}", name);
        let text = read_to_string(f.as_ref()).map_err(InputError::from)?;
        contents.push((name, text));
    }
    let sources: Vec<(&str, &str)> =
        contents.iter().map(|(n, t)| (n.as_str(), t.as_str())).collect();
    parse_sources(&sources)
}

/// Read a scenario from a sequence of named sources, which are concatenated in the given order.
pub fn parse_sources(sources: &[(&str, &str)]) -> Result<Scenario, Error> {
    let mut r = RecordReader::new(sources);

    // security devices
    let n_dev = r.next("device count")?.single_count()?;
    let max_isolation = r.next("maximum isolation")?.single_int()?;
    let iso = r.next("isolation scores")?.floats(n_dev)?;
    let max_iso_usability = r.next("maximum isolation usability")?.single_int()?;
    let iso_usa = r.next("isolation usability")?.floats(n_dev)?;
    let dev_cost = r.next("device cost")?.floats(n_dev)?;
    let devices = (0..n_dev)
        .map(|i| DeviceType { isolation: iso[i], usability: iso_usa[i], cost: dev_cost[i] })
        .collect();
    let devices = DeviceTable::new(max_iso_usability, devices);

    // operating systems
    let n_os = r.next("OS count")?.single_count()?;
    let n_families = r.next("OS family count")?.single_count()?;
    let mut families = vec![FamilyId::NONE; n_os];
    for f in 1..=n_families {
        let rec = r.next("OS family")?;
        rec.at_most((n_os + 1).saturating_sub(n_families))?;
        for i in 0..rec.len() {
            let os = rec.id(i, n_os)?;
            families[os - 1] = FamilyId(f);
        }
    }
    let max_diversity = r.next("maximum diversity")?.single_int()?;
    let div = r.next("diversity scores")?.floats(6)?;
    let diversity = DiversityTable([div[0], div[1], div[2], div[3], div[4], div[5]]);
    let max_div_usability = r.next("maximum diversity usability")?.single_int()?;
    let os_usa = r.next("OS usability")?.floats(n_os)?;
    let os_cost = r.next("OS cost")?.floats(n_os)?;
    let systems = (0..n_os)
        .map(|i| OperatingSystem { family: families[i], usability: os_usa[i], cost: os_cost[i] })
        .collect();
    let os = OsTable::new(systems, n_families);
    let num_services = r.next("service count")?.single_count()?;

    let policy = PolicyTables {
        devices,
        max_isolation,
        max_iso_usability,
        os,
        max_diversity,
        diversity,
        max_div_usability,
        num_services,
    };

    // topology
    let n_hosts = r.next("host count")?.single_count()?;
    let n_routers = r.next("router count")?.single_count()?;
    let n_links = r.next("link count")?.single_count()?;
    let mut topology = Topology::new(n_hosts, n_routers)?;
    for _ in 0..n_links {
        let rec = r.next("link")?;
        rec.exactly(2)?;
        let a = rec.id(0, n_hosts + n_routers)?;
        let b = rec.id(1, n_hosts + n_routers)?;
        topology.add_link(NodeId(a), NodeId(b))?;
    }

    // reachability
    let mut flows = FlowPolicy::new(n_hosts, policy.max_iso_usability);
    for src in 1..=n_hosts {
        let rec = r.next("reachability requirements")?;
        for j in rec.terminated_ids(n_hosts)? {
            flows.require(Flow::new(src, j));
        }
    }
    let n_ranks = r.next("flow rank count")?.single_count()?;
    for _ in 0..n_ranks {
        let rec = r.next("flow rank")?;
        rec.exactly(3)?;
        let src = rec.id(0, n_hosts)?;
        let dst = rec.id(1, n_hosts)?;
        let rank = rec.int(2)?;
        if rank < 1 {
            return Err(rec.invalid(rank).into());
        }
        flows.set_rank(Flow::new(src, dst), rank);
    }

    // services
    let mut services = ServiceRequirements::new();
    for host in 1..=n_hosts {
        let rec = r.next("service requirements")?;
        for s in rec.terminated_ids(num_services)? {
            services.require(NodeId(host), ServiceId(s));
        }
    }

    // sliders
    let rec = r.next("sliders")?;
    rec.exactly(3)?;
    let sliders =
        Sliders { resiliency: rec.float(0)?, usability: rec.float(1)?, cost: rec.int(2)? };

    if let Some(rec) = r.next_record() {
        return Err(InputError::TrailingInput(rec.at).into());
    }

    info!(
        "Read scenario with {} hosts, {} routers, {} links and {} device types",
        n_hosts, n_routers, n_links, n_dev
    );

    Ok(Scenario { policy, topology, flows, services, sliders })
}

/// One line of the input, split into its values
struct Record<'a> {
    at: Location,
    section: &'static str,
    tokens: Vec<&'a str>,
}

impl<'a> Record<'a> {
    fn len(&self) -> usize {
        self.tokens.len()
    }

    fn exactly(&self, n: usize) -> Result<(), InputError> {
        if self.tokens.len() != n {
            Err(InputError::TokenCount {
                at: self.at.clone(),
                section: self.section,
                expected: n,
                found: self.tokens.len(),
            })
        } else {
            Ok(())
        }
    }

    fn at_most(&self, n: usize) -> Result<(), InputError> {
        if self.tokens.len() > n {
            Err(InputError::TooManyTokens {
                at: self.at.clone(),
                section: self.section,
                max: n,
                found: self.tokens.len(),
            })
        } else {
            Ok(())
        }
    }

    fn int(&self, i: usize) -> Result<i64, InputError> {
        self.tokens[i].parse().map_err(|_| InputError::ParseInt {
            at: self.at.clone(),
            section: self.section,
            token: self.tokens[i].to_string(),
        })
    }

    fn float(&self, i: usize) -> Result<f64, InputError> {
        match self.tokens[i].parse::<f64>() {
            Ok(x) if x.is_finite() => Ok(x),
            _ => Err(InputError::ParseFloat {
                at: self.at.clone(),
                section: self.section,
                token: self.tokens[i].to_string(),
            }),
        }
    }

    fn invalid(&self, value: i64) -> InputError {
        InputError::InvalidValue { at: self.at.clone(), section: self.section, value }
    }

    /// Parse value `i` as an identifier in `1..=max`.
    fn id(&self, i: usize, max: usize) -> Result<usize, InputError> {
        let id = self.int(i)?;
        if id < 1 || id as usize > max {
            Err(InputError::IdOutOfRange { at: self.at.clone(), section: self.section, id, max })
        } else {
            Ok(id as usize)
        }
    }

    fn single_int(&self) -> Result<i64, InputError> {
        self.exactly(1)?;
        self.int(0)
    }

    fn single_count(&self) -> Result<usize, InputError> {
        let n = self.single_int()?;
        if n < 0 {
            Err(self.invalid(n))
        } else {
            Ok(n as usize)
        }
    }

    fn floats(&self, n: usize) -> Result<Vec<f64>, InputError> {
        self.exactly(n)?;
        (0..n).map(|i| self.float(i)).collect()
    }

    /// Parse a list of identifiers in `1..=max`, terminated by `0`.
    fn terminated_ids(&self, max: usize) -> Result<Vec<usize>, InputError> {
        let last = self.tokens.len() - 1;
        if self.int(last)? != 0 {
            return Err(InputError::MissingTerminator {
                at: self.at.clone(),
                section: self.section,
            });
        }
        (0..last).map(|i| self.id(i, max)).collect()
    }
}

/// Iterator over the records of a sequence of sources.
struct RecordReader<'a> {
    lines: Vec<(&'a str, usize, &'a str)>,
    pos: usize,
}

impl<'a> RecordReader<'a> {
    fn new(sources: &[(&'a str, &'a str)]) -> Self {
        let lines = sources
            .iter()
            .flat_map(|&(name, text)| text.lines().enumerate().map(move |(i, l)| (name, i + 1, l)))
            .collect();
        Self { lines, pos: 0 }
    }

    /// Returns the next record without assigning it to a section.
    fn next_record(&mut self) -> Option<Record<'a>> {
        while self.pos < self.lines.len() {
            let (source, line, text) = self.lines[self.pos];
            self.pos += 1;
            let text = text.trim();
            if text.is_empty() || text.starts_with('#') {
                continue;
            }
            let tokens: Vec<&str> = text
                .split(|c: char| c == ' ' || c == ',' || c == '\t')
                .filter(|t| !t.is_empty())
                .collect();
            if tokens.is_empty() {
                continue;
            }
            let at = Location { source: source.to_string(), line };
            return Some(Record { at, section: "", tokens });
        }
        None
    }

    /// Returns the next record of the given section.
    fn next(&mut self, section: &'static str) -> Result<Record<'a>, InputError> {
        match self.next_record() {
            Some(mut rec) => {
                rec.section = section;
                Ok(rec)
            }
            None => Err(InputError::UnexpectedEof { section }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn record_reader_skips_comments() {
        let text = "# comment\n\n  1, 2\t3  \n,,\n#x\n4";
        let mut r = RecordReader::new(&[("a", text)]);
        let rec = r.next("first").unwrap();
        assert_eq!(rec.tokens, vec!["1", "2", "3"]);
        assert_eq!(rec.at, Location { source: "a".to_string(), line: 3 });
        let rec = r.next("second").unwrap();
        assert_eq!(rec.tokens, vec!["4"]);
        assert_eq!(rec.at.line, 6);
        assert!(matches!(r.next("third"), Err(InputError::UnexpectedEof { section: "third" })));
    }

    #[test]
    fn sources_are_concatenated() {
        let mut r = RecordReader::new(&[("a", "1\n"), ("b", "# x\n2\n")]);
        assert_eq!(r.next("x").unwrap().at.source, "a");
        let rec = r.next("y").unwrap();
        assert_eq!(rec.at, Location { source: "b".to_string(), line: 2 });
    }

    #[test]
    fn terminated_lists() {
        let mut r = RecordReader::new(&[("a", "2 3 0\n0\n2 3\n4 0\n")]);
        assert_eq!(r.next("x").unwrap().terminated_ids(3).unwrap(), vec![2, 3]);
        assert_eq!(r.next("x").unwrap().terminated_ids(3).unwrap(), Vec::<usize>::new());
        assert!(matches!(
            r.next("x").unwrap().terminated_ids(3),
            Err(InputError::MissingTerminator { .. })
        ));
        assert!(matches!(
            r.next("x").unwrap().terminated_ids(3),
            Err(InputError::IdOutOfRange { id: 4, max: 3, .. })
        ));
    }

    #[test]
    fn value_parsing() {
        let mut r = RecordReader::new(&[("a", "1.5 x\n-1\n")]);
        let rec = r.next("x").unwrap();
        assert!(matches!(
            rec.exactly(3),
            Err(InputError::TokenCount { expected: 3, found: 2, .. })
        ));
        assert_eq!(rec.float(0).unwrap(), 1.5);
        assert!(matches!(rec.int(0), Err(InputError::ParseInt { .. })));
        assert!(matches!(rec.float(1), Err(InputError::ParseFloat { .. })));
        let rec = r.next("y").unwrap();
        assert!(matches!(rec.single_count(), Err(InputError::InvalidValue { value: -1, .. })));
    }

    #[test]
    fn non_finite_floats() {
        let mut r = RecordReader::new(&[("a", "inf -inf NaN infinity 1e400 2.5e3\n")]);
        let rec = r.next("x").unwrap();
        for i in 0..5 {
            assert!(matches!(rec.float(i), Err(InputError::ParseFloat { .. })));
        }
        assert_eq!(rec.float(5).unwrap(), 2500.0);
        assert!(matches!(rec.floats(6), Err(InputError::ParseFloat { .. })));
    }
}
