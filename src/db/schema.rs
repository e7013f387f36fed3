//! The static schema descriptor for the one queryable table.
//!
//! `perf_data` holds benchmark job results. The descriptor is immutable for
//! the process lifetime: the validator checks statements against it and the
//! prompt embeds its DDL so the model knows what columns exist.

/// A column in the known table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    pub primary_key: bool,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            nullable: true,
            primary_key: false,
        }
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.nullable = false;
        self
    }
}

/// The schema descriptor: one table, fixed columns.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSchema {
    pub name: String,
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    /// The benchmark results table this tool queries.
    pub fn perf_data() -> Self {
        Self {
            name: "perf_data".to_string(),
            columns: vec![
                ColumnDef::new("jobid", "TEXT").primary_key(),
                ColumnDef::new("date", "DATE").not_null(),
                ColumnDef::new("useremail", "TEXT").not_null(),
                ColumnDef::new("vcpu", "INTEGER"),
                ColumnDef::new("mem", "INTEGER"),
                ColumnDef::new("capacitygroup", "TEXT"),
                ColumnDef::new("containers", "INTEGER"),
                ColumnDef::new("benchmarks", "TEXT").not_null(),
                ColumnDef::new("benchmarkcontext", "TEXT"),
                ColumnDef::new("result", "TEXT"),
            ],
        }
    }

    /// Case-insensitive table name check.
    pub fn has_table(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Case-insensitive column name check.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns
            .iter()
            .any(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Renders the schema as SQLite DDL for the model prompt.
    pub fn to_ddl(&self) -> String {
        let cols: Vec<String> = self
            .columns
            .iter()
            .map(|c| {
                let mut def = format!("    {} {}", c.name, c.data_type);
                if c.primary_key {
                    def.push_str(" PRIMARY KEY");
                } else if !c.nullable {
                    def.push_str(" NOT NULL");
                }
                def
            })
            .collect();
        format!("CREATE TABLE {} (\n{}\n);", self.name, cols.join(",\n"))
    }
}
