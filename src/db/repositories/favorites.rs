use anyhow::Result;
use rusqlite::{params, OptionalExtension, Row};
use thiserror::Error;

use crate::db::Database;
use crate::models::{ImageRecord, MediaType};

/// Insert failure. Duplicate dates are distinguished from storage faults so
/// callers can show a recoverable message instead of treating every failure
/// the same way.
#[derive(Debug, Error)]
pub enum InsertError {
    #[error("a favorite for {0} already exists")]
    DuplicateDate(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

fn row_to_image(row: &Row) -> Result<ImageRecord, rusqlite::Error> {
    let media_type: Option<String> = row.get("media_type")?;

    Ok(ImageRecord {
        id: Some(row.get("id")?),
        title: row.get("title")?,
        date: row.get("date")?,
        explanation: row
            .get::<_, Option<String>>("explanation")?
            .unwrap_or_default(),
        url: row.get::<_, Option<String>>("url")?.unwrap_or_default(),
        hd_url: row.get::<_, Option<String>>("hd_url")?.unwrap_or_default(),
        media_type: media_type.map(MediaType::from).unwrap_or_default(),
        copyright: row
            .get::<_, Option<String>>("copyright")?
            .unwrap_or_default(),
    })
}

impl Database {
    /// Insert a favorite and return its assigned row id.
    ///
    /// `date` is unique in the table; inserting an already-favorited date
    /// fails with [`InsertError::DuplicateDate`] and leaves the table
    /// unchanged. The caller is expected to store the id back onto the
    /// record.
    pub async fn insert_favorite(&self, record: &ImageRecord) -> Result<i64, InsertError> {
        let record = record.clone();
        let date = record.date.clone();

        // The existence check and insert run as one job on the worker
        // thread, so no other writer can slip in between them.
        let inserted = self
            .execute(move |conn| {
                let already: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM favorites WHERE date = ?1)",
                    params![record.date],
                    |row| row.get(0),
                )?;
                if already {
                    return Ok(None);
                }

                conn.execute(
                    "INSERT INTO favorites (title, date, explanation, url, hd_url, media_type, copyright)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        record.title,
                        record.date,
                        record.explanation,
                        record.url,
                        record.hd_url,
                        record.media_type.as_str(),
                        record.copyright,
                    ],
                )?;

                Ok(Some(conn.last_insert_rowid()))
            })
            .await?;

        match inserted {
            Some(id) => Ok(id),
            None => Err(InsertError::DuplicateDate(date)),
        }
    }

    /// All favorites, newest date first.
    pub async fn get_all_favorites(&self) -> Result<Vec<ImageRecord>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, date, explanation, url, hd_url, media_type, copyright
                 FROM favorites
                 ORDER BY date DESC",
            )?;

            let favorites = stmt
                .query_map([], row_to_image)?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(favorites)
        })
        .await
    }

    pub async fn get_favorite_by_date(&self, date: &str) -> Result<Option<ImageRecord>> {
        let date = date.to_string();
        self.execute(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, date, explanation, url, hd_url, media_type, copyright
                 FROM favorites
                 WHERE date = ?1",
            )?;

            let favorite = stmt.query_row(params![date], row_to_image).optional()?;

            Ok(favorite)
        })
        .await
    }

    /// Whether a favorite is stored for `date`.
    pub async fn is_favorite(&self, date: &str) -> Result<bool> {
        let date = date.to_string();
        self.execute(move |conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM favorites WHERE date = ?1)",
                params![date],
                |row| row.get(0),
            )?;

            Ok(exists)
        })
        .await
    }

    /// Delete by row id, returning the number of rows removed (0 or 1).
    pub async fn delete_favorite(&self, id: i64) -> Result<usize> {
        self.execute(move |conn| {
            let removed = conn.execute("DELETE FROM favorites WHERE id = ?1", params![id])?;
            Ok(removed)
        })
        .await
    }

    /// Delete by date, returning the number of rows removed (0 or 1).
    pub async fn delete_favorite_by_date(&self, date: &str) -> Result<usize> {
        let date = date.to_string();
        self.execute(move |conn| {
            let removed = conn.execute("DELETE FROM favorites WHERE date = ?1", params![date])?;
            Ok(removed)
        })
        .await
    }

    pub async fn favorites_count(&self) -> Result<i64> {
        self.execute(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM favorites", [], |row| row.get(0))?;
            Ok(count)
        })
        .await
    }
}
