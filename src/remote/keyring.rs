use std::collections::HashMap;

use crate::error::CredentialError;

pub(crate) const SERVICE_NAME: &str = "daybook-remote";

fn attributes(server: &str) -> HashMap<&str, &str> {
    let mut attrs = HashMap::new();
    attrs.insert("service", SERVICE_NAME);
    attrs.insert("server", server);
    attrs
}

async fn open() -> Result<oo7::Keyring, CredentialError> {
    oo7::Keyring::new()
        .await
        .map_err(|e| CredentialError::Keyring(format!("Failed to connect to keyring: {}", e)))
}

/// Store the remote store API key in the system keyring via Secret Service.
pub async fn store_api_key(server: &str, key: &str) -> Result<(), CredentialError> {
    let keyring = open().await?;
    keyring
        .create_item(
            &format!("Daybook remote store ({})", server),
            &attributes(server),
            key.as_bytes(),
            true, // replace existing
        )
        .await
        .map_err(|e| CredentialError::Keyring(format!("Failed to store API key: {}", e)))?;
    log::info!("Stored API key for {}", server);
    Ok(())
}

/// Load the API key for `server`, if one was stored.
pub async fn load_api_key(server: &str) -> Result<Option<String>, CredentialError> {
    let keyring = open().await?;
    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| CredentialError::Keyring(format!("Failed to search keyring: {}", e)))?;

    if let Some(item) = items.first() {
        let secret = item
            .secret()
            .await
            .map_err(|e| CredentialError::Keyring(format!("Failed to read secret: {}", e)))?;
        let key = String::from_utf8(secret.to_vec()).map_err(|_| CredentialError::InvalidSecret)?;
        if !key.is_empty() {
            return Ok(Some(key));
        }
    }

    Ok(None)
}

pub async fn delete_api_key(server: &str) -> Result<(), CredentialError> {
    let keyring = open().await?;
    let items = keyring
        .search_items(&attributes(server))
        .await
        .map_err(|e| CredentialError::Keyring(format!("Failed to search keyring: {}", e)))?;

    for item in items {
        item.delete()
            .await
            .map_err(|e| CredentialError::Keyring(format!("Failed to delete credential: {}", e)))?;
    }

    Ok(())
}
