use crate::core::context::SessionContext;
use crate::core::ledger::VoteLedger;
use crate::core::registry::AllianceRegistry;
use crate::core::simulator::PointerEvent;
use crate::domain::model::{
    AllianceDisplay, AllianceSpec, PartyId, PartyMeta, Region, SeatAllocation, VoteRecord,
};
use crate::domain::ports::{SessionInput, SessionSource, Storage};
use crate::utils::error::{Result, SeatError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// File names inside the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataFiles {
    pub votes: String,
    pub seats: String,
    pub alliances: String,
    pub parties: String,
}

impl Default for DataFiles {
    fn default() -> Self {
        Self {
            votes: "votes.csv".to_string(),
            seats: "seats.csv".to_string(),
            alliances: "alliances.json".to_string(),
            parties: "parties.json".to_string(),
        }
    }
}

impl DataFiles {
    pub fn all(&self) -> [&str; 4] {
        [&self.votes, &self.seats, &self.alliances, &self.parties]
    }
}

#[derive(Debug, Deserialize)]
struct RawVote {
    region: String,
    #[serde(alias = "partido")]
    party: String,
    #[serde(alias = "votos")]
    votes: String,
}

#[derive(Debug, Deserialize)]
struct RawSeats {
    region: String,
    #[serde(alias = "cupos")]
    seats: String,
}

#[derive(Debug, Deserialize)]
struct RawAlliance {
    #[serde(alias = "nombre")]
    name: String,
    #[serde(alias = "partidos")]
    parties: Vec<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    short_name: Option<String>,
    #[serde(default)]
    long_name: Option<String>,
}

impl From<RawAlliance> for AllianceSpec {
    fn from(raw: RawAlliance) -> Self {
        AllianceSpec {
            name: raw.name.trim().to_string(),
            parties: raw.parties,
            display: AllianceDisplay {
                color: raw.color,
                short_name: raw.short_name,
                long_name: raw.long_name,
            },
        }
    }
}

/// Reads a session from vote, seat, alliance and party files behind a [`Storage`].
pub struct FileSessionSource<S: Storage> {
    storage: S,
    files: DataFiles,
}

impl<S: Storage> FileSessionSource<S> {
    pub fn new(storage: S) -> Self {
        Self::with_files(storage, DataFiles::default())
    }

    pub fn with_files(storage: S, files: DataFiles) -> Self {
        Self { storage, files }
    }

    pub fn files(&self) -> &DataFiles {
        &self.files
    }

    async fn read_votes(&self) -> Result<Vec<VoteRecord>> {
        let bytes = self.storage.read_file(&self.files.votes).await?;
        let records = parse_votes(&self.files.votes, &bytes)?;
        tracing::info!("📥 Loaded {} vote records from {}", records.len(), self.files.votes);
        Ok(records)
    }

    async fn read_seats(&self) -> Result<Vec<SeatAllocation>> {
        let bytes = self.storage.read_file(&self.files.seats).await?;
        let seats = parse_seats(&self.files.seats, &bytes)?;
        tracing::info!("📥 Loaded {} seat allocations from {}", seats.len(), self.files.seats);
        Ok(seats)
    }

    async fn read_alliances(&self) -> Result<Vec<AllianceSpec>> {
        let bytes = self.storage.read_file(&self.files.alliances).await?;
        let raw: Vec<RawAlliance> = serde_json::from_slice(&bytes)?;
        Ok(raw.into_iter().map(AllianceSpec::from).collect())
    }

    async fn read_parties(&self) -> Result<BTreeMap<PartyId, PartyMeta>> {
        if !self.storage.exists(&self.files.parties).await {
            tracing::debug!("No {} found, party metadata left empty", self.files.parties);
            return Ok(BTreeMap::new());
        }
        let bytes = self.storage.read_file(&self.files.parties).await?;
        let raw: BTreeMap<String, PartyMeta> = serde_json::from_slice(&bytes)?;
        Ok(raw
            .into_iter()
            .map(|(id, meta)| (PartyId::new(id), meta))
            .collect())
    }
}

#[async_trait]
impl<S: Storage> SessionSource for FileSessionSource<S> {
    async fn load(&self) -> Result<SessionInput> {
        let (votes, seats, alliances, parties) = tokio::try_join!(
            self.read_votes(),
            self.read_seats(),
            self.read_alliances(),
            self.read_parties()
        )?;

        Ok(SessionInput {
            votes,
            seats,
            alliances,
            parties,
        })
    }
}

impl SessionInput {
    /// Builds the immutable context and the initial grouping.
    pub fn into_session(self) -> Result<(SessionContext, AllianceRegistry)> {
        let registry = AllianceRegistry::from_specs(&self.alliances)?;
        let context = SessionContext::new(
            VoteLedger::from_records(self.votes),
            self.seats,
            self.parties,
        );
        Ok((context, registry))
    }
}

pub async fn read_gesture_script<S: Storage>(storage: &S, path: &str) -> Result<Vec<PointerEvent>> {
    let bytes = storage.read_file(path).await?;
    let events: Vec<PointerEvent> = serde_json::from_slice(&bytes)?;
    tracing::info!("🖱️  Loaded {} pointer events from {}", events.len(), path);
    Ok(events)
}

pub fn parse_votes(source_name: &str, bytes: &[u8]) -> Result<Vec<VoteRecord>> {
    read_rows::<RawVote>(bytes)?
        .into_iter()
        .map(|(line, raw)| {
            Ok(VoteRecord {
                region: Region::new(&raw.region),
                party: PartyId::new(&raw.party),
                votes: parse_field(source_name, line, "votes", &raw.votes)?,
            })
        })
        .collect()
}

pub fn parse_seats(source_name: &str, bytes: &[u8]) -> Result<Vec<SeatAllocation>> {
    read_rows::<RawSeats>(bytes)?
        .into_iter()
        .map(|(line, raw)| {
            let seats: u32 = parse_field(source_name, line, "seats", &raw.seats)?;
            if seats == 0 {
                return Err(SeatError::MalformedRecord {
                    source_name: source_name.to_string(),
                    line,
                    field: "seats".to_string(),
                    value: raw.seats,
                    reason: "a region needs at least one seat".to_string(),
                });
            }
            Ok(SeatAllocation {
                region: Region::new(&raw.region),
                seats,
            })
        })
        .collect()
}

fn read_rows<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<Vec<(u64, T)>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);
    let headers = reader.headers()?.clone();

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        rows.push((line, record.deserialize(Some(&headers))?));
    }
    Ok(rows)
}

fn parse_field<T>(source_name: &str, line: u64, field: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| SeatError::MalformedRecord {
            source_name: source_name.to_string(),
            line,
            field: field.to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })
}
