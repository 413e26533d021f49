/// Integration tests against the live GitHub API.
///
/// These tests make real network requests and are rate limited without a token.
/// Run with `cargo test -- --include-ignored` to include them.
#[cfg(test)]
mod tests {
    use relfetch::{
        fetch_latest_release, is_update_available, list_releases, Api, FetchOptions, RepoInfo,
    };

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_list_releases() {
        let releases = list_releases(&RepoInfo::new("fluffynuts", "NExpect"), None)
            .await
            .expect("list releases");

        assert!(!releases.is_empty());
    }

    #[tokio::test]
    #[ignore = "requires network access and downloads a release archive"]
    async fn test_fetch_and_unpack_mailpit() {
        let sandbox = tempfile::tempdir().unwrap();

        let files = fetch_latest_release(
            FetchOptions::new("axllent", "mailpit").destination(sandbox.path()),
        )
        .await
        .expect("fetch latest mailpit");

        let binary = if cfg!(windows) { "mailpit.exe" } else { "mailpit" };
        assert!(files.iter().any(|f| f.ends_with(binary)), "{files:?}");
        assert!(sandbox.path().join(binary).exists());
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_update_available_from_nothing() {
        let available = is_update_available(&RepoInfo::new("axllent", "mailpit"), "", None)
            .await
            .expect("check for update");

        assert!(available);
    }

    #[tokio::test]
    #[ignore = "requires network access"]
    async fn test_builder_resolves_tag() {
        let release = Api::new()
            .no_progress()
            .repo("axllent/mailpit")
            .unwrap()
            .tag("v1.21.0")
            .release()
            .await
            .expect("resolve tag");

        assert_eq!(release.version(), "v1.21.0");
        assert!(!release.assets.is_empty());
    }

    /// Unit test: `owner/repo` strings round-trip through `RepoInfo`.
    #[test]
    fn test_repo_info_from_str() {
        let repo: RepoInfo = "axllent/mailpit".parse().expect("parse repo");
        assert_eq!(repo.owner, "axllent");
        assert_eq!(repo.repo, "mailpit");
    }
}
