use std::{
    collections::HashMap,
    fmt::Display,
    fs,
    path::{Path, PathBuf},
};

use tracing::info;

use crate::{
    algebra::{render::Renderer, schema::Relation},
    config::Config,
    error::{Error, Result},
};

mod data_file;
pub mod schema_file;

/// Named relations declared by a schema file
pub struct Catalog {
    schema_file: Option<PathBuf>,
    relations: HashMap<String, Relation>,
    config: Config,
}

impl Catalog {
    /// Reads a schema file and creates its (empty) relations
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_config(path, Config::default())
    }

    pub fn open_with_config(path: impl AsRef<Path>, config: Config) -> Result<Self> {
        let path = path.as_ref();
        let schema = fs::read_to_string(path).map_err(|err| match Error::from(err) {
            Error::FileNotFound(_) => Error::FileNotFound(path.display().to_string()),
            other => other,
        })?;
        let mut catalog = Self::from_schema_str(&schema, config)?;
        catalog.schema_file = Some(path.to_path_buf());
        info!(
            schema = %path.display(),
            relations = catalog.relations.len(),
            "loaded schema file"
        );
        Ok(catalog)
    }

    /// Creates the relations declared by an in-memory schema definition
    pub fn from_schema_str(schema: &str, config: Config) -> Result<Self> {
        let relations = schema_file::parse(schema)?
            .into_iter()
            .filter_map(|r| Some((r.name()?.to_string(), r)))
            .collect();
        Ok(Self {
            schema_file: None,
            relations,
            config,
        })
    }

    pub fn schema_file(&self) -> Option<&Path> {
        self.schema_file.as_deref()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Relation with the given name (case-sensitive)
    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Returns the relation, or an error if it is not declared
    pub fn must_get_relation(&self, name: &str) -> Result<&Relation> {
        self.relation(name)
            .ok_or_else(|| Error::RelationNotFound(name.to_string()))
    }

    pub fn relation_mut(&mut self, name: &str) -> Option<&mut Relation> {
        self.relations.get_mut(name)
    }

    /// Reads a data file into the named relation, returns the number of lines read
    pub fn load(&mut self, name: &str, data_file: impl AsRef<Path>) -> Result<usize> {
        let config = self.config.clone();
        let relation = self
            .relation_mut(name)
            .ok_or_else(|| Error::RelationNotFound(name.to_string()))?;
        relation.read(data_file, &config)
    }

    /// Declared relation names, sorted
    pub fn relation_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.relations.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let renderer = Renderer::new(&self.config);
        for name in self.relation_names() {
            if let Some(relation) = self.relation(name) {
                writeln!(f, "{}", renderer.render_schema(relation))?;
            }
        }
        Ok(())
    }
}
