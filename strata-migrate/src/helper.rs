//! The server-side helper procedure used by the RPC path.
//!
//! The RPC backend runs scripts by calling a function that takes SQL text
//! and `EXECUTE`s it. Gateways expose such functions under
//! `/rpc/<name>`; this module only defines the function, installing it is
//! the job of a backend with a direct session.
//!
//! The function runs with its owner's rights, so EXECUTE is revoked from
//! `PUBLIC` and the gateway's public roles and granted only to the service
//! role. Callers must present the service key.

use serde::{Deserialize, Serialize};

/// Default helper function name.
pub const DEFAULT_FUNCTION: &str = "sql";

/// Default name of the helper's single text parameter.
pub const DEFAULT_PARAMETER: &str = "query";

/// Default schema the helper lives in.
pub const DEFAULT_SCHEMA: &str = "public";

/// Gateway roles that lose EXECUTE on the helper, besides `PUBLIC`.
pub const DEFAULT_REVOKE_FROM: &[&str] = &["anon", "authenticated"];

/// Roles allowed to call the helper.
pub const DEFAULT_GRANT_TO: &[&str] = &["service_role"];

/// `search_path` pinned on the helper. `pg_temp` goes last so temporary
/// objects cannot shadow real ones.
pub const DEFAULT_SEARCH_PATH: &[&str] = &["public", "pg_temp"];

/// Definition of the SQL-executing helper function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HelperProcedure {
    /// Schema/namespace.
    pub schema: String,
    /// Function name.
    pub name: String,
    /// Name of the text parameter carrying the SQL.
    pub parameter: String,
    /// Roles whose EXECUTE privilege is revoked. `PUBLIC` always is.
    pub revoke_from: Vec<String>,
    /// Roles granted EXECUTE.
    pub grant_to: Vec<String>,
    /// Schemas pinned as the function's `search_path`. Empty pins `''`.
    pub search_path: Vec<String>,
}

impl Default for HelperProcedure {
    fn default() -> Self {
        Self {
            schema: DEFAULT_SCHEMA.to_string(),
            name: DEFAULT_FUNCTION.to_string(),
            parameter: DEFAULT_PARAMETER.to_string(),
            revoke_from: to_strings(DEFAULT_REVOKE_FROM),
            grant_to: to_strings(DEFAULT_GRANT_TO),
            search_path: to_strings(DEFAULT_SEARCH_PATH),
        }
    }
}

impl HelperProcedure {
    /// Create a helper definition with the default names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the function name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the parameter name.
    pub fn parameter(mut self, parameter: impl Into<String>) -> Self {
        self.parameter = parameter.into();
        self
    }

    /// Set the schema.
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Set the roles losing EXECUTE, besides `PUBLIC`.
    pub fn revoke_from<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.revoke_from = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the roles granted EXECUTE.
    pub fn grant_to<I, S>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.grant_to = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Set the pinned `search_path`.
    pub fn search_path<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.search_path = schemas.into_iter().map(Into::into).collect();
        self
    }

    /// Schema-qualified, quoted function name.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", quote_ident(&self.schema), quote_ident(&self.name))
    }

    /// Function signature as used by `GRANT` and `REVOKE`.
    pub fn signature(&self) -> String {
        format!("{}(text)", self.qualified_name())
    }

    /// `CREATE OR REPLACE FUNCTION` for the helper, followed by the
    /// statements restricting who may call it.
    pub fn create_sql(&self) -> String {
        let param = quote_ident(&self.parameter);
        let search_path = if self.search_path.is_empty() {
            "''".to_string()
        } else {
            quote_list(&self.search_path)
        };

        let mut sql = format!(
            "CREATE OR REPLACE FUNCTION {name}({param} text)\n\
             RETURNS void\n\
             LANGUAGE plpgsql\n\
             SECURITY DEFINER\n\
             SET search_path = {search_path}\n\
             AS $strata$\n\
             BEGIN\n    EXECUTE {param};\nEND;\n\
             $strata$;\n",
            name = self.qualified_name(),
            param = param,
            search_path = search_path,
        );

        let mut revoked = String::from("PUBLIC");
        if !self.revoke_from.is_empty() {
            revoked.push_str(", ");
            revoked.push_str(&quote_list(&self.revoke_from));
        }
        sql.push_str(&format!(
            "REVOKE ALL ON FUNCTION {} FROM {};\n",
            self.signature(),
            revoked
        ));

        if !self.grant_to.is_empty() {
            sql.push_str(&format!(
                "GRANT EXECUTE ON FUNCTION {} TO {};\n",
                self.signature(),
                quote_list(&self.grant_to)
            ));
        }

        sql
    }

    /// Statement asking the gateway to reload its schema cache so the new
    /// function becomes callable.
    pub fn reload_sql(&self) -> &'static str {
        "NOTIFY pgrst, 'reload schema'"
    }
}

/// Quote an identifier, doubling embedded quotes.
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn quote_list(idents: &[String]) -> String {
    idents
        .iter()
        .map(|i| quote_ident(i))
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}
