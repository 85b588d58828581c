//! Destination table provisioning.

use rusqlite::Connection;

use crate::error::AppError;

pub const TABLE: &str = "indicadores_economicos";

const CREATE_INDICATORS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS indicadores_economicos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data_referencia DATE NOT NULL,
    indicador VARCHAR(50) NOT NULL,
    valor NUMERIC(10,4) NOT NULL,
    data_extracao TIMESTAMP NOT NULL,
    UNIQUE(data_referencia, indicador)
);
"#;

/// Ensure the destination table and its uniqueness constraint exist.
///
/// Safe to call on an already provisioned store.
pub fn provision(conn: &Connection) -> Result<(), AppError> {
    conn.execute_batch(CREATE_INDICATORS_TABLE)?;
    tracing::info!(table = TABLE, "table verified/created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_sql(conn: &Connection) -> String {
        conn.query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [TABLE],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[test]
    fn provision_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        provision(&conn).unwrap();
        let before = table_sql(&conn);

        provision(&conn).unwrap();
        assert_eq!(table_sql(&conn), before);
    }

    #[test]
    fn unique_constraint_rejects_duplicate_date_and_indicator() {
        let conn = Connection::open_in_memory().unwrap();
        provision(&conn).unwrap();

        let insert = "INSERT INTO indicadores_economicos (data_referencia, indicador, valor, data_extracao) \
                      VALUES ('2024-01-02', 'SELIC_META_ANUAL', 11.75, '2024-06-01 12:00:00')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());

        // Same date under another indicator is fine.
        conn.execute(
            "INSERT INTO indicadores_economicos (data_referencia, indicador, valor, data_extracao) \
             VALUES ('2024-01-02', 'IPCA_MENSAL', 0.42, '2024-06-01 12:00:00')",
            [],
        )
        .unwrap();
    }
}
