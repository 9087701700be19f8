//! Cross-source reconciliation.
//!
//! Two joins bring together records that describe the same publication:
//!
//! - [`TitleJoin`] pairs IDEALS papers with their separately deposited slide
//!   decks by canonical title. A presentation that matches a paper becomes
//!   that paper's `slides_url`; one that matches nothing stays a record of
//!   its own.
//! - [`SessionJoin`] enriches Zotero records with what the EventsAir export
//!   knows about the same session. Titles and identifiers of the two systems
//!   are not comparable, so the join goes through a caller-supplied mapping
//!   table and nothing else.
//!
//! ## Usage
//!
//! ```rust
//! use dppi::reconcile::TitleJoin;
//! use dppi::Publication;
//!
//! let mut paper = Publication::new("iPRES", 2023, "Data Rescue", "eng");
//! paper.creators = vec!["Jane Doe".to_string()];
//! let mut slides = Publication::new("iPRES", 2023, "DATA  rescue", "eng");
//! slides.landing_page_url = Some("https://hdl.handle.net/2142/2".to_string());
//!
//! let mut join = TitleJoin::new();
//! join.add_paper(paper).unwrap();
//! assert!(join.attach_presentation(slides));
//!
//! let merged = join.into_publications();
//! assert_eq!(merged.len(), 1);
//! assert_eq!(merged[0].slides_url.as_deref(), Some("https://hdl.handle.net/2142/2"));
//! ```

use serde::Deserialize;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::io::Read;
use std::path::Path;

use crate::eventsair::{event_sequence, event_source_name};
use crate::normalize::{canonicalize_title, push_unique};
use crate::{MergeError, Publication, Result};

/// Paper/presentation join on canonical titles.
///
/// Building is O(n) and each presentation lookup O(1). Output keeps the order
/// papers were added in, with stand-alone presentations after them.
#[derive(Debug, Default, Clone)]
pub struct TitleJoin {
    publications: Vec<Publication>,
    by_title: HashMap<String, usize>,
}

impl TitleJoin {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a non-presentation record.
    ///
    /// # Errors
    ///
    /// Returns [`MergeError::DuplicateTitle`] when another paper already has
    /// the same canonical title. The sources are expected to be clean, so a
    /// collision means two records are aliased and someone has to look.
    pub fn add_paper(&mut self, paper: Publication) -> Result<()> {
        let key = canonicalize_title(&paper.title);
        match self.by_title.entry(key) {
            Entry::Occupied(entry) => Err(MergeError::DuplicateTitle {
                title: paper.title,
                key: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                entry.insert(self.publications.len());
                self.publications.push(paper);
                Ok(())
            }
        }
    }

    /// Attaches a presentation to its paper, or keeps it as its own record.
    ///
    /// Returns `true` when a paper matched and the presentation was folded in.
    pub fn attach_presentation(&mut self, presentation: Publication) -> bool {
        let key = canonicalize_title(&presentation.title);
        match self.by_title.get(&key) {
            Some(&index) => {
                self.publications[index].slides_url = presentation.landing_page_url;
                true
            }
            None => {
                self.by_title.insert(key, self.publications.len());
                self.publications.push(presentation);
                false
            }
        }
    }

    pub fn into_publications(self) -> Vec<Publication> {
        self.publications
    }
}

#[derive(Debug, Deserialize)]
struct MappingRow {
    session_id: String,
    eventsair_id: u32,
}

/// Correspondence from reference-manager session ids to EventsAir agenda ids.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SessionMapping {
    by_session: HashMap<String, u32>,
    by_agenda: HashMap<u32, String>,
}

impl SessionMapping {
    /// Reads a CSV with `session_id` and `eventsair_id` columns.
    ///
    /// Other columns are ignored. The mapping must be one-to-one: a session
    /// mapped to two agenda ids, or an agenda id mapped from two sessions, is
    /// an error.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut mapping = Self::default();
        for row in csv_reader.deserialize() {
            let row: MappingRow = row?;
            mapping.insert(&row.session_id, row.eventsair_id)?;
        }
        Ok(mapping)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::from_reader(std::fs::File::open(path)?)
    }

    pub fn insert(&mut self, session_id: &str, eventsair_id: u32) -> Result<()> {
        if let Some(&previous) = self.by_session.get(session_id) {
            if previous == eventsair_id {
                return Ok(());
            }
            return Err(MergeError::InvalidFieldValue {
                field: "session_id".to_string(),
                message: format!(
                    "'{session_id}' is mapped to both {previous} and {eventsair_id}"
                ),
            });
        }
        if let Some(other) = self.by_agenda.get(&eventsair_id) {
            return Err(MergeError::InvalidFieldValue {
                field: "eventsair_id".to_string(),
                message: format!(
                    "{eventsair_id} is mapped from both '{other}' and '{session_id}'"
                ),
            });
        }
        self.by_session.insert(session_id.to_string(), eventsair_id);
        self.by_agenda.insert(eventsair_id, session_id.to_string());
        Ok(())
    }

    pub fn eventsair_id(&self, session_id: &str) -> Option<u32> {
        self.by_session.get(session_id).copied()
    }

    pub fn len(&self) -> usize {
        self.by_session.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_session.is_empty()
    }
}

/// What an agenda item contributes to a reference-manager record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Enrichment {
    pub abstract_text: Option<String>,
    pub institutions: Vec<String>,
    pub keywords: Vec<String>,
    pub license: Option<String>,
}

impl Enrichment {
    fn from_event(event: &Publication) -> Self {
        Self {
            abstract_text: event.abstract_text.clone(),
            institutions: event.institutions.clone(),
            keywords: event.keywords.clone(),
            license: event.license.clone(),
        }
    }

    /// Folds in another speaker record of the same agenda item.
    fn absorb(&mut self, event: &Publication) {
        if self.abstract_text.is_none() {
            self.abstract_text = event.abstract_text.clone();
        }
        if self.keywords.is_empty() {
            self.keywords = event.keywords.clone();
        }
        if self.license.is_none() {
            self.license = event.license.clone();
        }
        for institution in &event.institutions {
            push_unique(&mut self.institutions, institution.clone());
        }
    }

    /// Overwrites the enriched fields; values the event side lacks are kept.
    pub fn apply(&self, publication: &mut Publication) {
        if self.abstract_text.is_some() {
            publication.abstract_text = self.abstract_text.clone();
        }
        if !self.institutions.is_empty() {
            publication.institutions = self.institutions.clone();
        }
        if !self.keywords.is_empty() {
            publication.keywords = self.keywords.clone();
        }
        if self.license.is_some() {
            publication.license = self.license.clone();
        }
    }
}

/// EventsAir records re-keyed by agenda id, one entry per id.
#[derive(Debug, Default, Clone)]
pub struct EventIndex {
    by_id: HashMap<u32, Enrichment>,
}

impl EventIndex {
    /// Indexes event records by the agenda id in their synthetic source name.
    ///
    /// Speaker records of one agenda item fold into a single entry. Records
    /// whose source name carries no agenda id are left out.
    pub fn from_events<I>(events: I) -> Self
    where
        I: IntoIterator<Item = Publication>,
    {
        let mut by_id: HashMap<u32, Enrichment> = HashMap::new();
        for event in events {
            let Some(id) = event_sequence(&event.source_name) else {
                continue;
            };
            by_id
                .entry(id)
                .and_modify(|enrichment| enrichment.absorb(&event))
                .or_insert_with(|| Enrichment::from_event(&event));
        }
        Self { by_id }
    }

    pub fn get(&self, eventsair_id: u32) -> Option<&Enrichment> {
        self.by_id.get(&eventsair_id)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

/// The mapping table together with the events it points into.
#[derive(Debug, Default, Clone)]
pub struct SessionJoin {
    mapping: SessionMapping,
    events: EventIndex,
}

impl SessionJoin {
    #[must_use]
    pub fn new(mapping: SessionMapping, events: EventIndex) -> Self {
        Self { mapping, events }
    }

    /// Starts an enrichment pass in which each agenda item is used at most once.
    pub fn claims(&self) -> SessionClaims<'_> {
        SessionClaims {
            join: self,
            claimed: HashMap::new(),
        }
    }
}

/// What [`SessionClaims::enrich`] did with a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Enriched from this agenda id
    Enriched(u32),
    /// No mapping for the session, or no agenda item for the mapped id
    Unmatched,
    /// The agenda item already enriched the record titled `holder`
    Taken { eventsair_id: u32, holder: String },
}

/// One pass of a [`SessionJoin`] over a set of records.
///
/// The first record to reach an agenda item claims it. Later records mapped
/// onto the same item are left untouched, so no two records carry the same
/// agenda data or source name.
#[derive(Debug)]
pub struct SessionClaims<'j> {
    join: &'j SessionJoin,
    /// Agenda id to the title of the record that claimed it
    claimed: HashMap<u32, String>,
}

impl SessionClaims<'_> {
    /// Enriches `publication` if `session_id` maps onto an unclaimed agenda item.
    ///
    /// A matched record's source name is switched to the agenda item's, so it
    /// names both the source system and the external id. Records that are
    /// not enriched are not touched.
    pub fn enrich(&mut self, publication: &mut Publication, session_id: &str, conference: &str) -> Claim {
        let Some(eventsair_id) = self.join.mapping.eventsair_id(session_id) else {
            return Claim::Unmatched;
        };
        let Some(enrichment) = self.join.events.get(eventsair_id) else {
            return Claim::Unmatched;
        };
        match self.claimed.entry(eventsair_id) {
            Entry::Occupied(entry) => Claim::Taken {
                eventsair_id,
                holder: entry.get().clone(),
            },
            Entry::Vacant(entry) => {
                entry.insert(publication.title.clone());
                enrichment.apply(publication);
                publication.source_name = event_source_name(conference, eventsair_id);
                Claim::Enriched(eventsair_id)
            }
        }
    }
}
