use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::http::ApiClient;
use crate::update_dns::api::{RecordError, UpdateDns};

pub struct Cloudflare {
    client: ApiClient,
}

impl Cloudflare {
    pub fn new(client: ApiClient) -> Self {
        Cloudflare { client }
    }

    fn describe_errors(errors: &[CloudflareError]) -> String {
        errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl UpdateDns for Cloudflare {
    fn describe(&self) -> String {
        format!("Cloudflare[api={}]", self.client.url(""))
    }

    fn resolve_record_id(&self, zone_id: &str, name: &str) -> Result<String, RecordError> {
        // The name filter is applied server side, but near-matches can still
        // come back, so only an exact name counts.
        let body = self.client.get(
            &self
                .client
                .url(&format!("zones/{zone_id}/dns_records", zone_id = zone_id)),
            &[("name", name), ("type", "A")],
        )?;
        let cf_res: CloudflareResponse<Vec<CloudflareListDnsRecordRes>> =
            serde_json::from_slice(&body)?;
        if !cf_res.success {
            warn!(
                "[cloudflare] Listing {} failed: {}",
                name,
                Cloudflare::describe_errors(&cf_res.errors)
            );
            return Err(RecordError::NotFound);
        }

        let list = cf_res.result.unwrap_or_default();
        debug!("[cloudflare] {} candidate(s) for {}", list.len(), name);
        list.into_iter()
            .find(|record| record.name == name)
            .map(|record| record.id)
            .ok_or(RecordError::NotFound)
    }

    fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        name: &str,
        new_ip: &str,
    ) -> Result<(), RecordError> {
        let payload = serde_json::to_string(&CloudflareUpdateDnsRecordReq {
            record_type: "A",
            name,
            content: new_ip,
        })?;
        let body = self.client.put(
            &self.client.url(&format!(
                "zones/{zone_id}/dns_records/{id}",
                zone_id = zone_id,
                id = record_id,
            )),
            payload,
        )?;

        let cf_res: CloudflareResponse<serde_json::Value> = serde_json::from_slice(&body)?;
        if !cf_res.success {
            return Err(RecordError::Rejected(Cloudflare::describe_errors(
                &cf_res.errors,
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct CloudflareResponse<T> {
    result: Option<T>,
    success: bool,
    #[serde(default)]
    errors: Vec<CloudflareError>,
}

#[derive(Deserialize, Debug)]
struct CloudflareError {
    code: u32,
    message: String,
}

#[derive(Deserialize, Debug)]
struct CloudflareListDnsRecordRes {
    id: String,
    name: String,
}

#[derive(Serialize)]
struct CloudflareUpdateDnsRecordReq<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
}
