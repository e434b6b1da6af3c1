//! Admin listing reads. Translates the filter contract into one constrained
//! query pair (count + page); no business logic lives here.

use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::error::Result;
use crate::models::candidate::{ApplicationStatus, Candidate, Department};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Default)]
pub struct CandidateFilters {
    pub department: Option<Department>,
    pub status: Option<ApplicationStatus>,
    pub search: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ListPage {
    pub count: i64,
    pub page: u32,
    pub next: Option<u32>,
    pub previous: Option<u32>,
    pub results: Vec<Candidate>,
}

#[derive(Clone)]
pub struct ListingService {
    pool: PgPool,
}

impl ListingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(
        &self,
        filters: &CandidateFilters,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> Result<ListPage> {
        let page = page.unwrap_or(1).max(1);
        let page_size = page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE);

        let mut count_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(*) FROM candidates WHERE TRUE");
        push_filters(&mut count_query, filters);
        let count: i64 = count_query
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        let mut page_query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT * FROM candidates WHERE TRUE");
        push_filters(&mut page_query, filters);
        page_query
            .push(" ORDER BY created_at DESC OFFSET ")
            .push_bind(page_offset(page, page_size))
            .push(" LIMIT ")
            .push_bind(page_size as i64);
        let results = page_query
            .build_query_as::<Candidate>()
            .fetch_all(&self.pool)
            .await?;

        let (next, previous) = page_links(count, page, page_size);
        Ok(ListPage {
            count,
            page,
            next,
            previous,
            results,
        })
    }
}

fn push_filters(query: &mut QueryBuilder<Postgres>, filters: &CandidateFilters) {
    if let Some(department) = filters.department {
        query.push(" AND department = ").push_bind(department);
    }
    if let Some(status) = filters.status {
        query.push(" AND status = ").push_bind(status);
    }
    if let Some(search) = filters.search.as_deref().filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        query
            .push(" AND (full_name ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR email ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// LIKE metacharacters in user search terms match literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Widened before multiplying; page comes straight from the query string and
/// `u32::MAX * page_size` must not overflow.
fn page_offset(page: u32, page_size: u32) -> i64 {
    (page as i64 - 1) * page_size as i64
}

fn page_links(count: i64, page: u32, page_size: u32) -> (Option<u32>, Option<u32>) {
    let has_next = (page as i64) * (page_size as i64) < count;
    let next = has_next.then(|| page + 1);
    let previous = (page > 1).then(|| page - 1);
    (next, previous)
}
