//! Seed data helpers for e2e tests.

use mcp_directory_server::directory_store::{
    DirectoryStore, Entry, NewEntry, RepoStatsPatch, SqliteDirectoryStore,
};

/// Insert `count` entries named "Server 01".. with star counts 1..=count.
pub fn seed_starred_entries(store: &SqliteDirectoryStore, count: i64) -> Vec<Entry> {
    (1..=count)
        .map(|i| {
            let entry = store
                .insert_entry(&NewEntry {
                    name: format!("Server {:02}", i),
                    slug: format!("server-{:02}", i),
                    short_desc: format!("Does useful thing number {}", i),
                    homepage_url: Some(format!("https://example.com/server-{:02}", i)),
                    repo_url: Some(format!("https://github.com/acme/server-{:02}", i)),
                    docs_url: None,
                    logo_url: None,
                })
                .expect("seed insert failed");
            store
                .update_repo_stats(
                    &entry.id,
                    &RepoStatsPatch {
                        stars: i,
                        last_commit: None,
                        license: "mit".to_string(),
                        readme: None,
                    },
                )
                .expect("seed stats failed");
            entry
        })
        .collect()
}

/// Insert one entry with the given name/slug/short description.
pub fn seed_entry(store: &SqliteDirectoryStore, name: &str, slug: &str, short_desc: &str) -> Entry {
    store
        .insert_entry(&NewEntry {
            name: name.to_string(),
            slug: slug.to_string(),
            short_desc: short_desc.to_string(),
            homepage_url: Some(format!("https://example.com/{}", slug)),
            repo_url: Some(format!("https://github.com/acme/{}", slug)),
            docs_url: None,
            logo_url: None,
        })
        .expect("seed insert failed")
}
