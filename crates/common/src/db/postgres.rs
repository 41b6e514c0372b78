//! PostgreSQL store
//!
//! Loads the catalog in one read-only repeatable-read transaction and
//! writes each change set in one read-write transaction: parents are
//! upserted before children, deletions run children first, and join rows
//! of every upserted owner are replaced wholesale.

use async_trait::async_trait;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    AccessMode, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait, IsolationLevel,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use super::models::{
    artwork, artwork_taxonomy, exhibition, exhibition_artworks, loan, loan_artworks, loan_request,
    museum, museum_contact, requested_artwork, restoration, restoration_team, restorer,
    taxonomy_entry,
};
use super::{CatalogStore, DbPool};
use crate::config::StorageConfig;
use crate::domain::{
    Artwork, Catalog, ChangeSet, DateRange, Exhibition, Loan, LoanRequest, PartnerMuseum,
    Restoration, Restorer, TaxonomyEntry, TaxonomyKind,
};
use crate::errors::Result;

const PHONE: &str = "phone";
const EMAIL: &str = "email";

pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Connect and, when configured, bootstrap the schema
    pub async fn connect(config: &StorageConfig) -> Result<Self> {
        let pool = DbPool::new(config).await?;
        if config.run_migrations {
            pool.migrate().await?;
        }
        Ok(Self::new(pool))
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn load(&self) -> Result<Catalog> {
        let start = Instant::now();
        let txn = self
            .pool
            .conn()
            .begin_with_config(Some(IsolationLevel::RepeatableRead), Some(AccessMode::ReadOnly))
            .await?;
        let snapshot = read_snapshot(&txn).await?;
        txn.commit().await?;

        debug!(rows = snapshot.len(), elapsed_ms = start.elapsed().as_millis() as u64, "Catalog loaded");
        Ok(Catalog::from_changes(snapshot))
    }

    async fn commit(&self, changes: ChangeSet) -> Result<()> {
        if changes.is_empty() {
            return Ok(());
        }
        let touched = changes.len();

        let txn = self.pool.conn().begin().await?;
        // Dropping the transaction on error rolls it back
        write_changes(&txn, changes).await?;
        txn.commit().await?;

        debug!(touched, "Change set committed");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.pool.ping().await
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

fn group<K: std::hash::Hash + Eq, V: Ord>(pairs: impl IntoIterator<Item = (K, V)>) -> HashMap<K, BTreeSet<V>> {
    let mut grouped: HashMap<K, BTreeSet<V>> = HashMap::new();
    for (key, value) in pairs {
        grouped.entry(key).or_default().insert(value);
    }
    grouped
}

fn deleted<T>(changes: &BTreeMap<Uuid, Option<T>>) -> Vec<Uuid> {
    changes
        .iter()
        .filter(|(_, change)| change.is_none())
        .map(|(id, _)| *id)
        .collect()
}

async fn read_snapshot<C: ConnectionTrait>(db: &C) -> Result<ChangeSet> {
    let mut snapshot = ChangeSet::default();

    let mut kinds = HashMap::new();
    for row in taxonomy_entry::Entity::find().all(db).await? {
        let kind: TaxonomyKind = row.kind.parse()?;
        kinds.insert(row.id, kind);
        snapshot.taxonomy.insert(
            row.id,
            Some(TaxonomyEntry {
                id: row.id,
                kind,
                name: row.name,
                description: row.description,
            }),
        );
    }

    let mut classification = group(
        artwork_taxonomy::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.artwork_id, l.entry_id)),
    );
    for row in artwork::Entity::find().all(db).await? {
        let mut artwork = Artwork {
            id: row.id,
            title: row.title,
            author: row.author,
            valuation: row.valuation,
            creation_date: row.creation_date,
            museum_entry_date: row.museum_entry_date,
            state: row.state.parse()?,
            kind: row.kind.parse()?,
            technique_ids: BTreeSet::new(),
            material_ids: BTreeSet::new(),
            period_id: row.period_id,
            room_id: row.room_id,
            style_ids: BTreeSet::new(),
            image: row.image,
        };
        for entry_id in classification.remove(&row.id).unwrap_or_default() {
            match kinds.get(&entry_id) {
                Some(TaxonomyKind::Style) => artwork.style_ids.insert(entry_id),
                Some(TaxonomyKind::Technique) => artwork.technique_ids.insert(entry_id),
                Some(TaxonomyKind::Material) => artwork.material_ids.insert(entry_id),
                _ => {
                    warn!(artwork_id = %row.id, entry_id = %entry_id, "Ignoring misplaced classification row");
                    false
                }
            };
        }
        snapshot.artworks.insert(artwork.id, Some(artwork));
    }

    for row in restorer::Entity::find().all(db).await? {
        snapshot.restorers.insert(
            row.id,
            Some(Restorer {
                id: row.id,
                first_name: row.first_name,
                last_names: row.last_names,
                email: row.email,
                phone: row.phone,
                employment: row.employment.parse()?,
                specialty: row.specialty.parse()?,
                occupied: row.occupied,
            }),
        );
    }

    let mut teams = group(
        restoration_team::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.restoration_id, l.restorer_id)),
    );
    for row in restoration::Entity::find().all(db).await? {
        snapshot.restorations.insert(
            row.id,
            Some(Restoration {
                id: row.id,
                artwork_id: row.artwork_id,
                team: teams.remove(&row.id).unwrap_or_default(),
                start_date: row.start_date,
                end_date: row.end_date,
                damage_report: row.damage_report,
                restoration_type: row.restoration_type,
            }),
        );
    }

    let mut lent = group(
        loan_artworks::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.loan_id, l.artwork_id)),
    );
    for row in loan::Entity::find().all(db).await? {
        snapshot.loans.insert(
            row.id,
            Some(Loan {
                id: row.id,
                artwork_ids: lent.remove(&row.id).unwrap_or_default(),
                museum_id: row.museum_id,
                period: DateRange::new(row.start_date, row.end_date),
                returned_on: row.returned_on,
            }),
        );
    }

    let mut shown = group(
        exhibition_artworks::Entity::find()
            .all(db)
            .await?
            .into_iter()
            .map(|l| (l.exhibition_id, l.artwork_id)),
    );
    for row in exhibition::Entity::find().all(db).await? {
        snapshot.exhibitions.insert(
            row.id,
            Some(Exhibition {
                id: row.id,
                name: row.name,
                description: row.description,
                image: row.image,
                period: DateRange::new(row.start_date, row.end_date),
                artwork_ids: shown.remove(&row.id).unwrap_or_default(),
            }),
        );
    }

    let mut contacts: HashMap<Uuid, Vec<museum_contact::Model>> = HashMap::new();
    for contact in museum_contact::Entity::find()
        .order_by_asc(museum_contact::Column::Position)
        .all(db)
        .await?
    {
        contacts.entry(contact.museum_id).or_default().push(contact);
    }
    for row in museum::Entity::find().all(db).await? {
        let (phones, emails): (Vec<_>, Vec<_>) = contacts
            .remove(&row.id)
            .unwrap_or_default()
            .into_iter()
            .partition(|c| c.channel == PHONE);
        snapshot.museums.insert(
            row.id,
            Some(PartnerMuseum {
                id: row.id,
                name: row.name,
                country: row.country,
                city: row.city,
                catalog_url: row.catalog_url,
                phones: phones.into_iter().map(|c| c.value).collect(),
                emails: emails.into_iter().map(|c| c.value).collect(),
            }),
        );
    }

    let mut requested: HashMap<Uuid, Vec<String>> = HashMap::new();
    for title in requested_artwork::Entity::find()
        .order_by_asc(requested_artwork::Column::Position)
        .all(db)
        .await?
    {
        requested.entry(title.request_id).or_default().push(title.title);
    }
    for row in loan_request::Entity::find().all(db).await? {
        snapshot.loan_requests.insert(
            row.id,
            Some(LoanRequest {
                id: row.id,
                museum_id: row.museum_id,
                requested_artworks: requested.remove(&row.id).unwrap_or_default(),
                period: DateRange::new(row.start_date, row.end_date),
                status: row.status.parse()?,
                notes: row.notes,
            }),
        );
    }

    Ok(snapshot)
}

async fn write_changes(txn: &DatabaseTransaction, changes: ChangeSet) -> Result<()> {
    // Upserts, parents first
    for entry in changes.taxonomy.values().flatten() {
        upsert_taxonomy(txn, entry).await?;
    }
    for museum in changes.museums.values().flatten() {
        upsert_museum(txn, museum).await?;
    }
    for artwork in changes.artworks.values().flatten() {
        upsert_artwork(txn, artwork).await?;
    }
    for restorer in changes.restorers.values().flatten() {
        upsert_restorer(txn, restorer).await?;
    }
    for restoration in changes.restorations.values().flatten() {
        upsert_restoration(txn, restoration).await?;
    }
    for loan in changes.loans.values().flatten() {
        upsert_loan(txn, loan).await?;
    }
    for exhibition in changes.exhibitions.values().flatten() {
        upsert_exhibition(txn, exhibition).await?;
    }
    for request in changes.loan_requests.values().flatten() {
        upsert_loan_request(txn, request).await?;
    }

    // Deletions, children first
    let ids = deleted(&changes.loan_requests);
    if !ids.is_empty() {
        loan_request::Entity::delete_many()
            .filter(loan_request::Column::Id.is_in(ids))
            .exec(txn)
            .await?;
    }
    let ids = deleted(&changes.exhibitions);
    if !ids.is_empty() {
        exhibition::Entity::delete_many()
            .filter(exhibition::Column::Id.is_in(ids))
            .exec(txn)
            .await?;
    }
    let ids = deleted(&changes.loans);
    if !ids.is_empty() {
        loan::Entity::delete_many()
            .filter(loan::Column::Id.is_in(ids))
            .exec(txn)
            .await?;
    }
    let ids = deleted(&changes.restorations);
    if !ids.is_empty() {
        restoration::Entity::delete_many()
            .filter(restoration::Column::Id.is_in(ids))
            .exec(txn)
            .await?;
    }
    let ids = deleted(&changes.restorers);
    if !ids.is_empty() {
        restorer::Entity::delete_many()
            .filter(restorer::Column::Id.is_in(ids))
            .exec(txn)
            .await?;
    }
    let ids = deleted(&changes.artworks);
    if !ids.is_empty() {
        artwork::Entity::delete_many()
            .filter(artwork::Column::Id.is_in(ids))
            .exec(txn)
            .await?;
    }
    let ids = deleted(&changes.museums);
    if !ids.is_empty() {
        museum::Entity::delete_many()
            .filter(museum::Column::Id.is_in(ids))
            .exec(txn)
            .await?;
    }
    let ids = deleted(&changes.taxonomy);
    if !ids.is_empty() {
        taxonomy_entry::Entity::delete_many()
            .filter(taxonomy_entry::Column::Id.is_in(ids))
            .exec(txn)
            .await?;
    }

    Ok(())
}

async fn upsert_taxonomy(txn: &DatabaseTransaction, entry: &TaxonomyEntry) -> Result<()> {
    use taxonomy_entry::Column;

    taxonomy_entry::Entity::insert(taxonomy_entry::ActiveModel {
        id: Set(entry.id),
        kind: Set(entry.kind.as_str().to_string()),
        name: Set(entry.name.clone()),
        description: Set(entry.description.clone()),
    })
    .on_conflict(
        OnConflict::column(Column::Id)
            .update_columns([Column::Kind, Column::Name, Column::Description])
            .to_owned(),
    )
    .exec(txn)
    .await?;
    Ok(())
}

async fn upsert_museum(txn: &DatabaseTransaction, museum: &PartnerMuseum) -> Result<()> {
    use museum::Column;

    museum::Entity::insert(museum::ActiveModel {
        id: Set(museum.id),
        name: Set(museum.name.clone()),
        country: Set(museum.country.clone()),
        city: Set(museum.city.clone()),
        catalog_url: Set(museum.catalog_url.clone()),
    })
    .on_conflict(
        OnConflict::column(Column::Id)
            .update_columns([Column::Name, Column::Country, Column::City, Column::CatalogUrl])
            .to_owned(),
    )
    .exec(txn)
    .await?;

    museum_contact::Entity::delete_many()
        .filter(museum_contact::Column::MuseumId.eq(museum.id))
        .exec(txn)
        .await?;

    let phones = museum.phones.iter().map(|p| (PHONE, p));
    let emails = museum.emails.iter().map(|e| (EMAIL, e));
    let rows: Vec<_> = phones
        .chain(emails)
        .enumerate()
        .map(|(position, (channel, value))| museum_contact::ActiveModel {
            id: Set(Uuid::new_v4()),
            museum_id: Set(museum.id),
            channel: Set(channel.to_string()),
            value: Set(value.clone()),
            position: Set(position as i32),
        })
        .collect();
    if !rows.is_empty() {
        museum_contact::Entity::insert_many(rows).exec(txn).await?;
    }
    Ok(())
}

async fn upsert_artwork(txn: &DatabaseTransaction, artwork: &Artwork) -> Result<()> {
    use artwork::Column;

    artwork::Entity::insert(artwork::ActiveModel {
        id: Set(artwork.id),
        title: Set(artwork.title.clone()),
        author: Set(artwork.author.clone()),
        valuation: Set(artwork.valuation),
        creation_date: Set(artwork.creation_date.clone()),
        museum_entry_date: Set(artwork.museum_entry_date),
        state: Set(artwork.state.as_str().to_string()),
        kind: Set(artwork.kind.as_str().to_string()),
        period_id: Set(artwork.period_id),
        room_id: Set(artwork.room_id),
        image: Set(artwork.image.clone()),
    })
    .on_conflict(
        OnConflict::column(Column::Id)
            .update_columns([
                Column::Title,
                Column::Author,
                Column::Valuation,
                Column::CreationDate,
                Column::MuseumEntryDate,
                Column::State,
                Column::Kind,
                Column::PeriodId,
                Column::RoomId,
                Column::Image,
            ])
            .to_owned(),
    )
    .exec(txn)
    .await?;

    artwork_taxonomy::Entity::delete_many()
        .filter(artwork_taxonomy::Column::ArtworkId.eq(artwork.id))
        .exec(txn)
        .await?;

    let rows: Vec<_> = artwork
        .style_ids
        .iter()
        .chain(&artwork.technique_ids)
        .chain(&artwork.material_ids)
        .map(|entry_id| artwork_taxonomy::ActiveModel {
            artwork_id: Set(artwork.id),
            entry_id: Set(*entry_id),
        })
        .collect();
    if !rows.is_empty() {
        artwork_taxonomy::Entity::insert_many(rows).exec(txn).await?;
    }
    Ok(())
}

async fn upsert_restorer(txn: &DatabaseTransaction, restorer: &Restorer) -> Result<()> {
    use restorer::Column;

    restorer::Entity::insert(restorer::ActiveModel {
        id: Set(restorer.id),
        first_name: Set(restorer.first_name.clone()),
        last_names: Set(restorer.last_names.clone()),
        email: Set(restorer.email.clone()),
        phone: Set(restorer.phone.clone()),
        employment: Set(restorer.employment.as_str().to_string()),
        specialty: Set(restorer.specialty.as_str().to_string()),
        occupied: Set(restorer.occupied),
    })
    .on_conflict(
        OnConflict::column(Column::Id)
            .update_columns([
                Column::FirstName,
                Column::LastNames,
                Column::Email,
                Column::Phone,
                Column::Employment,
                Column::Specialty,
                Column::Occupied,
            ])
            .to_owned(),
    )
    .exec(txn)
    .await?;
    Ok(())
}

async fn upsert_restoration(txn: &DatabaseTransaction, restoration: &Restoration) -> Result<()> {
    use restoration::Column;

    restoration::Entity::insert(restoration::ActiveModel {
        id: Set(restoration.id),
        artwork_id: Set(restoration.artwork_id),
        start_date: Set(restoration.start_date),
        end_date: Set(restoration.end_date),
        damage_report: Set(restoration.damage_report.clone()),
        restoration_type: Set(restoration.restoration_type.clone()),
    })
    .on_conflict(
        OnConflict::column(Column::Id)
            .update_columns([
                Column::StartDate,
                Column::EndDate,
                Column::DamageReport,
                Column::RestorationType,
            ])
            .to_owned(),
    )
    .exec(txn)
    .await?;

    restoration_team::Entity::delete_many()
        .filter(restoration_team::Column::RestorationId.eq(restoration.id))
        .exec(txn)
        .await?;

    let rows: Vec<_> = restoration
        .team
        .iter()
        .map(|restorer_id| restoration_team::ActiveModel {
            restoration_id: Set(restoration.id),
            restorer_id: Set(*restorer_id),
        })
        .collect();
    if !rows.is_empty() {
        restoration_team::Entity::insert_many(rows).exec(txn).await?;
    }
    Ok(())
}

async fn upsert_loan(txn: &DatabaseTransaction, loan: &Loan) -> Result<()> {
    use loan::Column;

    loan::Entity::insert(loan::ActiveModel {
        id: Set(loan.id),
        museum_id: Set(loan.museum_id),
        start_date: Set(loan.period.start),
        end_date: Set(loan.period.end),
        returned_on: Set(loan.returned_on),
    })
    .on_conflict(
        OnConflict::column(Column::Id)
            .update_columns([Column::MuseumId, Column::StartDate, Column::EndDate, Column::ReturnedOn])
            .to_owned(),
    )
    .exec(txn)
    .await?;

    loan_artworks::Entity::delete_many()
        .filter(loan_artworks::Column::LoanId.eq(loan.id))
        .exec(txn)
        .await?;

    let rows: Vec<_> = loan
        .artwork_ids
        .iter()
        .map(|artwork_id| loan_artworks::ActiveModel {
            loan_id: Set(loan.id),
            artwork_id: Set(*artwork_id),
        })
        .collect();
    if !rows.is_empty() {
        loan_artworks::Entity::insert_many(rows).exec(txn).await?;
    }
    Ok(())
}

async fn upsert_exhibition(txn: &DatabaseTransaction, exhibition: &Exhibition) -> Result<()> {
    use exhibition::Column;

    exhibition::Entity::insert(exhibition::ActiveModel {
        id: Set(exhibition.id),
        name: Set(exhibition.name.clone()),
        description: Set(exhibition.description.clone()),
        image: Set(exhibition.image.clone()),
        start_date: Set(exhibition.period.start),
        end_date: Set(exhibition.period.end),
    })
    .on_conflict(
        OnConflict::column(Column::Id)
            .update_columns([
                Column::Name,
                Column::Description,
                Column::Image,
                Column::StartDate,
                Column::EndDate,
            ])
            .to_owned(),
    )
    .exec(txn)
    .await?;

    exhibition_artworks::Entity::delete_many()
        .filter(exhibition_artworks::Column::ExhibitionId.eq(exhibition.id))
        .exec(txn)
        .await?;

    let rows: Vec<_> = exhibition
        .artwork_ids
        .iter()
        .map(|artwork_id| exhibition_artworks::ActiveModel {
            exhibition_id: Set(exhibition.id),
            artwork_id: Set(*artwork_id),
        })
        .collect();
    if !rows.is_empty() {
        exhibition_artworks::Entity::insert_many(rows).exec(txn).await?;
    }
    Ok(())
}

async fn upsert_loan_request(txn: &DatabaseTransaction, request: &LoanRequest) -> Result<()> {
    use loan_request::Column;

    loan_request::Entity::insert(loan_request::ActiveModel {
        id: Set(request.id),
        museum_id: Set(request.museum_id),
        start_date: Set(request.period.start),
        end_date: Set(request.period.end),
        status: Set(request.status.as_str().to_string()),
        notes: Set(request.notes.clone()),
    })
    .on_conflict(
        OnConflict::column(Column::Id)
            .update_columns([Column::StartDate, Column::EndDate, Column::Status, Column::Notes])
            .to_owned(),
    )
    .exec(txn)
    .await?;

    requested_artwork::Entity::delete_many()
        .filter(requested_artwork::Column::RequestId.eq(request.id))
        .exec(txn)
        .await?;

    let rows: Vec<_> = request
        .requested_artworks
        .iter()
        .enumerate()
        .map(|(position, title)| requested_artwork::ActiveModel {
            id: Set(Uuid::new_v4()),
            request_id: Set(request.id),
            title: Set(title.clone()),
            position: Set(position as i32),
        })
        .collect();
    if !rows.is_empty() {
        requested_artwork::Entity::insert_many(rows).exec(txn).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_deletions_are_listed_as_deleted() {
        let kept = Uuid::new_v4();
        let gone = Uuid::new_v4();
        let changes: BTreeMap<Uuid, Option<u8>> = BTreeMap::from([(kept, Some(1)), (gone, None)]);
        assert_eq!(deleted(&changes), vec![gone]);
    }

    #[test]
    fn link_rows_are_grouped_by_owner() {
        let owner = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let grouped = group([(owner, a), (owner, b), (owner, a)]);
        assert_eq!(grouped[&owner], BTreeSet::from([a, b]));
    }
}
