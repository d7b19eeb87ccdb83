//! Endpoint and descriptor commands.

use anyhow::Result;
use console::style;

use vmsquery::api::inventory::{
    appearance_descriptions, cameras, event_subtopics, fetch_endpoint, servers, site, sites,
};
use vmsquery::api::{ApiClient, Endpoint, ResponseBody};
use vmsquery::models::{facet_tags, NamedResource};

use super::helpers::{print_json, spinner};

pub async fn cmd_endpoint(
    client: &ApiClient,
    endpoint: Endpoint,
    id: Option<&str>,
    raw: bool,
) -> Result<()> {
    println!(
        "{} {}",
        style(endpoint.title()).bold(),
        style(client.endpoint_url(endpoint.path())).dim()
    );
    let pb = spinner(format!("Fetching {}...", endpoint.path()));

    if raw {
        let response = fetch_endpoint(client, endpoint, id).await;
        pb.finish_and_clear();
        match response?.body {
            ResponseBody::Json(value) => print_json(&value),
            ResponseBody::Bytes(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
        }
        return Ok(());
    }

    match endpoint {
        Endpoint::Cameras | Endpoint::Servers | Endpoint::Sites => {
            let listing = match endpoint {
                Endpoint::Cameras => cameras(client).await,
                Endpoint::Servers => servers(client).await,
                _ => sites(client).await,
            };
            pb.finish_and_clear();
            print_resources(&listing?);
        }
        Endpoint::Site => {
            let result = site(client, id.unwrap_or_default()).await;
            pb.finish_and_clear();
            print_json(&result?);
        }
        Endpoint::EventSubtopics => {
            let topics = event_subtopics(client).await;
            pb.finish_and_clear();
            for topic in topics? {
                println!("{}", topic);
            }
        }
        Endpoint::AppearanceDescriptions => {
            let descriptors = appearance_descriptions(client).await;
            pb.finish_and_clear();
            for d in descriptors? {
                println!("{}:{}", d.facet, d.tag);
            }
        }
        Endpoint::Health | Endpoint::Capabilities => {
            let response = fetch_endpoint(client, endpoint, id).await;
            pb.finish_and_clear();
            match response?.body {
                ResponseBody::Json(value) => print_json(&value),
                ResponseBody::Bytes(bytes) => println!("{}", String::from_utf8_lossy(&bytes)),
            }
        }
    }
    Ok(())
}

fn print_resources(resources: &[NamedResource]) {
    if resources.is_empty() {
        println!("{}", style("No entries").yellow());
        return;
    }
    for r in resources {
        println!("{:<40} {}", r.id.as_deref().unwrap_or("-"), r.label());
    }
    println!("{}", style(format!("{} entries", resources.len())).dim());
}

pub async fn cmd_descriptors(client: &ApiClient) -> Result<()> {
    let pb = spinner("Fetching appearance descriptions...");
    let descriptors = appearance_descriptions(client).await;
    pb.finish_and_clear();

    let grouped = facet_tags(&descriptors?);
    if grouped.is_empty() {
        println!("{}", style("No descriptors available").yellow());
    }
    for (facet, tags) in grouped {
        println!("{}", style(&facet).bold());
        for tag in tags {
            println!("  {}:{}", facet, tag);
        }
    }
    Ok(())
}
