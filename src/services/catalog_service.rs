//! Read side of the catalog: filtered book listing, chapters per book and the
//! distinct values that drive the front-end filter menus.

use crate::{
    errors::ServiceResult,
    models::{
        book::{Book, FilterOptions},
        chapter::Chapter,
    },
    services::database::Database,
};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};

const BOOK_COLUMNS: &str = "SELECT id, name, author, subject, language, image_link FROM book";

/// Optional filters accepted by the book listing. Empty strings are ignored.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct BookFilter {
    pub language: Option<String>,
    pub subject: Option<String>,
    pub author: Option<String>,
    pub search: Option<String>,
}

/// Book columns a predicate may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Name,
    Author,
    Subject,
    Language,
}

impl Column {
    pub fn as_str(self) -> &'static str {
        match self {
            Column::Name => "name",
            Column::Author => "author",
            Column::Subject => "subject",
            Column::Language => "language",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Equals,
    Contains,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub column: Column,
    pub operator: Operator,
    pub value: String,
}

impl Predicate {
    fn new(column: Column, operator: Operator, value: &str) -> Self {
        Self {
            column,
            operator,
            value: value.to_string(),
        }
    }
}

impl BookFilter {
    /// Predicates for every filter that is present and non-empty.
    pub fn predicates(&self) -> Vec<Predicate> {
        let equalities = [
            (Column::Language, &self.language),
            (Column::Subject, &self.subject),
            (Column::Author, &self.author),
        ];

        let mut predicates: Vec<Predicate> = equalities
            .into_iter()
            .filter_map(|(column, value)| {
                present(value).map(|v| Predicate::new(column, Operator::Equals, v))
            })
            .collect();

        if let Some(term) = present(&self.search) {
            predicates.push(Predicate::new(Column::Name, Operator::Contains, term));
        }
        predicates
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Fold predicates into a `SELECT` over `book`, joined with `AND`.
///
/// Column names come from [`Column`]; every value goes through `push_bind`, so
/// each placeholder is emitted together with its value.
pub fn books_query(predicates: &[Predicate]) -> QueryBuilder<'static, Sqlite> {
    let mut builder = QueryBuilder::<Sqlite>::new(BOOK_COLUMNS);

    for (i, predicate) in predicates.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder.push(predicate.column.as_str());
        match predicate.operator {
            Operator::Equals => {
                builder.push(" = ");
                builder.push_bind(predicate.value.clone());
            }
            Operator::Contains => {
                builder.push(" LIKE ");
                builder.push_bind(format!("%{}%", escape_like(&predicate.value)));
                builder.push(" ESCAPE '\\'");
            }
        }
    }

    builder
}

/// Escape LIKE wildcards so the term matches literally.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Clone, Debug)]
pub struct CatalogService {
    db: Database,
}

impl CatalogService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Books matching every present filter, in storage order.
    pub async fn list_books(&self, filter: &BookFilter) -> ServiceResult<Vec<Book>> {
        let predicates = filter.predicates();
        let mut builder = books_query(&predicates);
        let books = builder
            .build_query_as::<Book>()
            .fetch_all(self.db.pool())
            .await?;
        Ok(books)
    }

    /// Chapters of one book. Unknown or non-numeric ids yield an empty list.
    pub async fn list_chapters(&self, book_id: &str) -> ServiceResult<Vec<Chapter>> {
        let Ok(book_id) = book_id.trim().parse::<i64>() else {
            return Ok(Vec::new());
        };

        let chapters = sqlx::query_as::<_, Chapter>(
            "SELECT id, book_id, chapter_name, chapter_number, audio_link
             FROM chapters WHERE book_id = ?",
        )
        .bind(book_id)
        .fetch_all(self.db.pool())
        .await?;
        Ok(chapters)
    }

    /// Distinct authors, languages and subjects present in the catalog.
    pub async fn list_filter_options(&self) -> ServiceResult<FilterOptions> {
        let (authors, languages, subjects) = tokio::try_join!(
            self.distinct(Column::Author),
            self.distinct(Column::Language),
            self.distinct(Column::Subject),
        )?;

        Ok(FilterOptions {
            authors,
            languages,
            subjects,
        })
    }

    async fn distinct(&self, column: Column) -> ServiceResult<Vec<String>> {
        let sql = format!("SELECT DISTINCT {} FROM book", column.as_str());
        let values = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(self.db.pool())
            .await?;
        Ok(values)
    }
}
