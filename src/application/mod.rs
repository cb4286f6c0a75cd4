//! Application layer - Website provisioners and the synthesis service.

pub mod ssr_site;
pub mod static_site;
pub mod synth;

use crate::domain::template::{logical_id, Output, Stack};
use crate::error::Result;

/// Adds `<id>DistributionDomainName` pointing at the distribution's generated
/// hostname and returns the output's logical id.
pub(crate) fn export_distribution_domain_name(
    stack: &mut Stack,
    id: &str,
    domain_name: &str,
    distribution_id: &str,
) -> Result<String> {
    let output_id = logical_id(&[id, "DistributionDomainName"])?;
    let value = stack.get_att(distribution_id, "DomainName")?;
    stack.add_output(
        &output_id,
        Output::new(value).with_description(format!("CloudFront domain name for {domain_name}")),
    )?;
    Ok(output_id)
}
