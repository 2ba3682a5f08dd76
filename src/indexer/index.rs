use inrix_partition::PartitionKey;
use std::fmt;

use crate::error::IndexerError;

/// PostgreSQL silently truncates longer names.
const MAX_IDENTIFIER_LEN: usize = 63;

/// `YYYYMM` appended to the base table name.
const PARTITION_SUFFIX_LEN: usize = 6;

/// Schema-qualified base table the monthly partitions are named after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    schema: String,
    base: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, base: impl Into<String>) -> Result<Self, IndexerError> {
        let schema = schema.into();
        let base = base.into();
        for ident in [&schema, &base] {
            if !is_plain_identifier(ident) {
                return Err(IndexerError::InvalidIdentifier(ident.clone()));
            }
        }
        // Every derived table and index name must survive without truncation,
        // or the three named indexes collapse onto one name.
        let longest = base.len() + PARTITION_SUFFIX_LEN + IndexSpec::longest_name_suffix();
        if longest > MAX_IDENTIFIER_LEN {
            return Err(IndexerError::IdentifierTooLong {
                base,
                max: MAX_IDENTIFIER_LEN - PARTITION_SUFFIX_LEN - IndexSpec::longest_name_suffix(),
            });
        }
        Ok(Self { schema, base })
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// The physical table holding `key`'s month, e.g. `inrix.raw_data201307`.
    pub fn partition(&self, key: &PartitionKey) -> PartitionTable {
        PartitionTable {
            schema: self.schema.clone(),
            name: format!("{}{}", self.base, key.suffix()),
        }
    }
}

impl Default for TableRef {
    fn default() -> Self {
        Self {
            schema: "inrix".to_string(),
            base: "raw_data".to_string(),
        }
    }
}

/// Identifiers are spliced into DDL unquoted, so only plain lowercase-style
/// names are accepted.
fn is_plain_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    ident.len() <= MAX_IDENTIFIER_LEN
        && (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionTable {
    schema: String,
    name: String,
}

impl PartitionTable {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn qualified(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PartitionTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}

/// How `CREATE INDEX` statements are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CreateMode {
    /// Anonymous indexes; re-running after a partial batch creates duplicates.
    #[default]
    Plain,
    /// Named indexes guarded by `IF NOT EXISTS`.
    IfNotExists,
}

/// The three indexes every partition receives, in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexSpec {
    Score,
    Tmc,
    /// `tx` restricted to observed speed records (`score = 30`), which keeps
    /// the timestamp index a fraction of the table size.
    ObservedTimestamp,
}

impl IndexSpec {
    pub const ALL: [IndexSpec; 3] = [
        IndexSpec::Score,
        IndexSpec::Tmc,
        IndexSpec::ObservedTimestamp,
    ];

    pub fn label(self) -> &'static str {
        match self {
            IndexSpec::Score => "score",
            IndexSpec::Tmc => "tmc",
            IndexSpec::ObservedTimestamp => "timestamp",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            IndexSpec::Score => "score",
            IndexSpec::Tmc => "tmc",
            IndexSpec::ObservedTimestamp => "tx",
        }
    }

    pub fn predicate(self) -> Option<&'static str> {
        match self {
            IndexSpec::ObservedTimestamp => Some("score = 30"),
            _ => None,
        }
    }

    fn name_suffix(self) -> &'static str {
        match self {
            IndexSpec::Score => "score_idx",
            IndexSpec::Tmc => "tmc_idx",
            IndexSpec::ObservedTimestamp => "tx_observed_idx",
        }
    }

    /// Length of the longest `_<suffix>` appended to a partition name.
    fn longest_name_suffix() -> usize {
        Self::ALL
            .iter()
            .map(|spec| spec.name_suffix().len() + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn statement(self, table: &PartitionTable, mode: CreateMode) -> String {
        let column = self.column();
        let head = match mode {
            CreateMode::Plain => format!("CREATE INDEX ON {table}({column})"),
            CreateMode::IfNotExists => format!(
                "CREATE INDEX IF NOT EXISTS {}_{} ON {table}({column})",
                table.name(),
                self.name_suffix()
            ),
        };
        match self.predicate() {
            Some(predicate) => format!("{head} WHERE {predicate};"),
            None => format!("{head};"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn july_2013() -> PartitionTable {
        TableRef::default().partition(&PartitionKey::new(2013, 7).unwrap())
    }

    #[test]
    fn partition_table_is_schema_qualified() {
        let table = july_2013();
        assert_eq!(table.qualified(), "inrix.raw_data201307");
        assert_eq!(table.name(), "raw_data201307");
    }

    #[test]
    fn plain_statements_match_reference_ddl() {
        let table = july_2013();
        let statements: Vec<String> = IndexSpec::ALL
            .iter()
            .map(|spec| spec.statement(&table, CreateMode::Plain))
            .collect();

        assert_eq!(
            statements,
            [
                "CREATE INDEX ON inrix.raw_data201307(score);",
                "CREATE INDEX ON inrix.raw_data201307(tmc);",
                "CREATE INDEX ON inrix.raw_data201307(tx) WHERE score = 30;",
            ]
        );
    }

    #[test]
    fn if_not_exists_statements_are_named() {
        let table = july_2013();
        assert_eq!(
            IndexSpec::ObservedTimestamp.statement(&table, CreateMode::IfNotExists),
            "CREATE INDEX IF NOT EXISTS raw_data201307_tx_observed_idx \
             ON inrix.raw_data201307(tx) WHERE score = 30;"
        );
        assert_eq!(
            IndexSpec::Tmc.statement(&table, CreateMode::IfNotExists),
            "CREATE INDEX IF NOT EXISTS raw_data201307_tmc_idx ON inrix.raw_data201307(tmc);"
        );
    }

    #[test]
    fn only_the_timestamp_index_is_partial() {
        let partial: Vec<_> = IndexSpec::ALL
            .iter()
            .filter(|spec| spec.predicate().is_some())
            .collect();
        assert_eq!(partial, [&IndexSpec::ObservedTimestamp]);
    }

    #[test]
    fn rejects_identifiers_that_need_quoting() {
        for bad in ["", "raw data", "inrix;drop", "9lives", "Ä"] {
            assert!(
                matches!(
                    TableRef::new("inrix", bad),
                    Err(IndexerError::InvalidIdentifier(_))
                ),
                "{bad:?} should be rejected"
            );
        }
        assert!(TableRef::new("_staging", "raw_data_v2").is_ok());
    }

    #[test]
    fn base_names_that_would_truncate_are_rejected() {
        // 41 + "201307" + "_tx_observed_idx" is exactly 63.
        let fits = "a".repeat(41);
        let table = TableRef::new("inrix", fits.as_str()).expect("longest base that fits");
        let key = PartitionKey::new(2013, 7).unwrap();
        for spec in IndexSpec::ALL {
            let sql = spec.statement(&table.partition(&key), CreateMode::IfNotExists);
            let name = sql
                .strip_prefix("CREATE INDEX IF NOT EXISTS ")
                .and_then(|rest| rest.split_whitespace().next())
                .unwrap();
            assert!(name.len() <= MAX_IDENTIFIER_LEN, "{name} is too long");
        }

        for len in [42, 57] {
            let err = TableRef::new("inrix", "a".repeat(len)).unwrap_err();
            assert!(
                matches!(err, IndexerError::IdentifierTooLong { max: 41, .. }),
                "base of {len} chars: got {err:?}"
            );
        }
    }
}
