//! Plan Builder (C4): groups files by server, then partitions each server's
//! files round-robin into `threads_per_host` buckets.

use crate::locations::{FileSpec, FilesReport, RetrieveMethod, ServersReport};

/// A server's files destined for a single worker.
#[derive(Debug, Clone)]
pub struct Bucket {
    pub server_host: String,
    pub retrieve_method: RetrieveMethod,
    pub files: Vec<FileSpec>,
}

/// Ordered sequence of buckets, constructed once and consumed once by the
/// Parallel Fetcher.
pub type Plan = Vec<Bucket>;

/// Build a Plan from a files report: group by server, then round-robin
/// each server's files across `threads_per_host` buckets (file *i* goes to
/// bucket *i mod N*, preserving listing order within each bucket). Empty
/// buckets are dropped.
pub fn build_plan(files: &FilesReport, threads_per_host: usize) -> Plan {
    let servers = crate::locations::group_by_server(files);
    build_plan_from_servers(&servers, threads_per_host)
}

fn build_plan_from_servers(servers: &ServersReport, threads_per_host: usize) -> Plan {
    let mut plan = Plan::new();

    let mut hosts: Vec<&String> = servers.keys().collect();
    hosts.sort();

    for host in hosts {
        let group = &servers[host];
        let mut buckets: Vec<Vec<FileSpec>> = (0..threads_per_host).map(|_| Vec::new()).collect();

        for (i, file) in group.files.iter().enumerate() {
            buckets[i % threads_per_host].push(file.clone());
        }

        for files in buckets {
            if files.is_empty() {
                continue;
            }
            plan.push(Bucket {
                server_host: group.host.clone(),
                retrieve_method: group.retrieve_method,
                files,
            });
        }
    }

    plan
}
