use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Supplier {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Supplier {
    /// # Errors
    /// Returns a client-facing message if a required field is blank.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name is required".into());
        }
        if self.phone.trim().is_empty() {
            return Err("phone is required".into());
        }
        if let Some(email) = &self.email
            && !email.contains('@')
        {
            return Err("email is not valid".into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let mut supplier = Supplier {
            name: "MedSupply Co".into(),
            contact_person: None,
            email: Some("orders@medsupply.test".into()),
            phone: "555-0100".into(),
            address: None,
        };
        assert!(supplier.validate().is_ok());

        supplier.email = Some("nope".into());
        assert!(supplier.validate().is_err());

        supplier.email = None;
        supplier.phone = "  ".into();
        assert!(supplier.validate().is_err());
    }
}
