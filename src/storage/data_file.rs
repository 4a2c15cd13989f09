use std::{
    fs::File,
    io::{BufRead, BufReader},
    path::Path,
};

use tracing::info;

use crate::{
    algebra::{
        schema::{Relation, Tuple},
        types::{DataType, Value},
    },
    config::Config,
    error::{Error, Result},
};

impl Relation {
    /// Loads the tuples of a data file into this relation
    ///
    /// Returns the number of lines read. Lines equal to a tuple already in the
    /// relation are read but do not add a tuple. Nothing is added unless the
    /// whole file parses.
    pub fn read(&mut self, path: impl AsRef<Path>, config: &Config) -> Result<usize> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| match Error::from(err) {
            Error::FileNotFound(_) => Error::FileNotFound(path.display().to_string()),
            other => other,
        })?;
        self.read_from(BufReader::new(file), &path.display().to_string(), config)
    }

    /// Loads tuples from any reader, `source` names it in error messages
    pub fn read_from(&mut self, reader: impl BufRead, source: &str, config: &Config) -> Result<usize> {
        let mut parsed = Vec::new();
        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }

            let fields: Vec<&str> = line.split(config.field_separator).collect();
            if fields.len() != self.degree() {
                return Err(Error::ArityMismatch {
                    expected: self.degree(),
                    got: fields.len(),
                });
            }
            let values = self
                .attributes()
                .iter()
                .zip(fields)
                .map(|(attr, field)| parse_value(attr.datatype, field.trim(), source, config))
                .collect::<Result<Vec<_>>>()?;
            parsed.push(Tuple::new(values));
        }

        let count = parsed.len();
        for tuple in parsed {
            self.add_tuple(tuple)?;
        }
        info!(
            relation = self.name().unwrap_or_default(),
            source,
            lines = count,
            tuples = self.len(),
            "loaded data file"
        );
        Ok(count)
    }
}

fn parse_value(datatype: DataType, field: &str, source: &str, config: &Config) -> Result<Value> {
    match datatype {
        DataType::Text => {
            if field.eq_ignore_ascii_case(&config.null_literal) {
                return Ok(Value::Null);
            }
            match field.strip_prefix('\'').and_then(|f| f.strip_suffix('\'')) {
                Some(text) => Ok(Value::Text(text.to_string())),
                None => Err(Error::TypeMismatch(format!(
                    "for TEXT attribute: {} in {}",
                    field, source
                ))),
            }
        }
        DataType::Numeric => field.parse::<f64>().map(Value::Numeric).map_err(|_| {
            Error::TypeMismatch(format!("for NUMERIC attribute: {} in {}", field, source))
        }),
    }
}
