//! Reference resolution tests over an in-memory corpus.
//!
//! Each test builds a small project, runs a find session to completion and
//! checks which files are reported and what they point at.

#[cfg(test)]
mod tests {
    use refnav::catalog::MemoryCatalog;
    use refnav::corpus::CorpusOptions;
    use refnav::error::ScanAnomaly;
    use refnav::model::{Category, CategoryFilter, LocalId, ObjectHandle, TypeTag};
    use refnav::resolve::{HitKind, ResultDetail};
    use refnav::session::{ScanSession, SessionOptions, SessionState};

    const TARGET: &str = "abc0123456789abcdef0123456789abc";
    const OTHER: &str = "fedcba9876543210fedcba9876543210";

    fn target() -> ObjectHandle {
        ObjectHandle::asset("Assets/Crate.prefab", "GameObject")
    }

    fn base_catalog() -> MemoryCatalog {
        let mut catalog = MemoryCatalog::new();
        catalog.add_file(
            "Assets/Crate.prefab",
            "GameObject",
            Some(TARGET),
            "--- !u!1 &1\nGameObject:\n  m_Name: Crate\n",
        );
        catalog
    }

    fn run(catalog: &MemoryCatalog, filter: CategoryFilter, options: SessionOptions) -> ScanSession {
        let mut session = ScanSession::find(catalog, target(), filter, options).expect("session");
        session.run_to_completion(catalog);
        assert_eq!(session.state(), SessionState::Completed);
        session
    }

    #[test]
    fn test_local_referrer_becomes_sub_reference() {
        let mut catalog = base_catalog();
        catalog.add_file(
            "Assets/scene.unity",
            "SceneAsset",
            None,
            format!(
                "--- !u!1 &100\n\
                 GameObject:\n  \
                   m_Prefab: {{fileID: 1, guid: {}, type: 3}}\n\
                 --- !u!114 &200\n\
                 MonoBehaviour:\n  \
                   m_Target: {{fileID: 100}}\n",
                TARGET
            ),
        );

        let session = run(&catalog, CategoryFilter::SCENE, SessionOptions::default());
        assert_eq!(session.results().len(), 1);

        let result = &session.results()[0];
        assert_eq!(result.path(), std::path::Path::new("Assets/scene.unity"));
        assert_eq!(result.category, Category::Scene);

        let from_200 = ObjectHandle::embedded(
            "Assets/scene.unity",
            LocalId::new("200"),
            TypeTag::new("MonoBehaviour"),
        );
        assert!(result.sub_references().contains(&from_200));

        let kinds: Vec<HitKind> = result.hits.iter().map(|h| h.kind).collect();
        assert_eq!(kinds, vec![HitKind::GlobalReference, HitKind::CrossDocumentLocal]);
        assert_eq!(result.hits[1].containing_document, LocalId::new("200"));
    }

    #[test]
    fn test_local_ids_are_file_scoped() {
        let mut catalog = base_catalog();
        catalog
            .add_file(
                "Assets/A.prefab",
                "GameObject",
                None,
                format!(
                    "--- !u!114 &5\nMonoBehaviour:\n  m_Crate: {{fileID: 1, guid: {}, type: 3}}\n",
                    TARGET
                ),
            )
            .add_file(
                "Assets/B.prefab",
                "GameObject",
                None,
                format!(
                    "--- !u!114 &5\nMonoBehaviour:\n  m_Other: {{fileID: 1, guid: {}, type: 3}}\n\
                     --- !u!114 &6\nMonoBehaviour:\n  m_Peer: {{fileID: 5}}\n",
                    OTHER
                ),
            );

        let session = run(&catalog, CategoryFilter::PREFAB, SessionOptions::default());
        assert_eq!(session.results().len(), 1);

        let result = &session.results()[0];
        assert_eq!(result.path(), std::path::Path::new("Assets/A.prefab"));
        assert!(result
            .sub_references()
            .iter()
            .all(|handle| handle.path == std::path::Path::new("Assets/A.prefab")));
        assert!(result.hits.iter().all(|hit| hit.kind != HitKind::CrossDocumentLocal));
    }

    #[test]
    fn test_oversized_file_is_skipped() {
        let text = format!("--- !u!28 &2800000\nTexture2D:\n  m_Source: {}\n", TARGET);
        let mut catalog = base_catalog();
        catalog
            .add_sized_file("Assets/Huge.png", "Texture2D", None, text, 50_000_000)
            .add_sized_file(
                "Assets/Loader.cs",
                "MonoScript",
                None,
                format!("// crate guid {}\nclass Loader {{}}\n", TARGET),
                2_048,
            );

        // Type exclusion would hide the texture anyway; clear it so the size
        // check is what drops it.
        let options = SessionOptions {
            corpus: CorpusOptions {
                file_size_limit: 10_000_000,
                excluded_types: Vec::new(),
                ..CorpusOptions::default()
            },
            ..SessionOptions::default()
        };
        let session = run(&catalog, CategoryFilter::FILES, options);

        let paths: Vec<_> = session.results().iter().map(|r| r.path().to_path_buf()).collect();
        assert!(paths.contains(&"Assets/Loader.cs".into()));
        assert!(!paths.contains(&"Assets/Huge.png".into()));
        assert_eq!(session.skipped().len(), 1);
        assert_eq!(session.skipped()[0].path(), std::path::Path::new("Assets/Huge.png"));
    }

    #[test]
    fn test_excluded_type_is_dropped_silently() {
        let mut catalog = base_catalog();
        catalog.add_file(
            "Assets/Baked.asset",
            "LightingDataAsset",
            None,
            format!("--- !u!1 &1\nLightingDataAsset:\n  m_Ref: {}\n", TARGET),
        );

        let session = run(&catalog, CategoryFilter::FILES, SessionOptions::default());
        assert!(session.results().is_empty());
        assert!(session.skipped().is_empty());
    }

    #[test]
    fn test_unreadable_file_is_reported() {
        let mut catalog = base_catalog();
        catalog.add_unreadable_file("Assets/Broken.mat", "Material");

        let session = run(&catalog, CategoryFilter::MATERIAL, SessionOptions::default());
        assert!(session.results().is_empty());
        assert_eq!(session.skipped().len(), 1);
        assert_eq!(session.skipped()[0].path(), std::path::Path::new("Assets/Broken.mat"));
    }

    #[test]
    fn test_loaded_hierarchy_uses_assignability() {
        let script = ObjectHandle::asset("Assets/Mover.cs", "MonoScript");
        let mut catalog = MemoryCatalog::new();
        catalog
            .add_file("Assets/Mover.cs", "MonoScript", Some(TARGET), "class Mover {}")
            .set_declared_type(script.clone(), "Mover")
            .allow_assignment("Mover", "FastMover")
            .add_file(
                "Assets/Level.unity",
                "SceneAsset",
                None,
                format!(
                    "--- !u!114 &10\nMonoBehaviour:\n  m_Script: {{fileID: 11500000, guid: {}, type: 3}}\n\
                     --- !u!114 &20\nMonoBehaviour:\n  m_Script: {{fileID: 11500000, guid: {}, type: 3}}\n",
                    TARGET, OTHER
                ),
            )
            .set_hierarchy(
                "Assets/Level.unity",
                vec![
                    ObjectHandle::embedded("Assets/Level.unity", LocalId::new("10"), "Mover"),
                    ObjectHandle::embedded("Assets/Level.unity", LocalId::new("20"), "FastMover"),
                    ObjectHandle::embedded("Assets/Level.unity", LocalId::new("30"), "Light"),
                ],
            );

        let mut session = ScanSession::find(&catalog, script, CategoryFilter::SCENE, SessionOptions::default())
            .expect("session");
        session.run_to_completion(&catalog);

        assert_eq!(session.results().len(), 1);
        let subs: Vec<&str> = session.results()[0]
            .sub_references()
            .iter()
            .map(|h| h.type_tag.as_str())
            .collect();
        assert_eq!(subs, vec!["Mover", "FastMover"]);
    }

    #[test]
    fn test_static_fallback_resolves_script_of_component() {
        let mut catalog = base_catalog();
        catalog
            .add_file("Assets/Spawner.cs", "MonoScript", Some(OTHER), "class Spawner {}")
            .add_file(
                "Assets/Arena.prefab",
                "GameObject",
                None,
                format!(
                    "--- !u!114 &40\nMonoBehaviour:\n  \
                       m_Script: {{fileID: 11500000, guid: {other}, type: 3}}\n  \
                       prefab: {{fileID: 1, guid: {target}, type: 3}}\n",
                    other = OTHER,
                    target = TARGET
                ),
            );

        let session = run(&catalog, CategoryFilter::PREFAB, SessionOptions::default());
        assert_eq!(session.results().len(), 1);

        let result = &session.results()[0];
        assert_eq!(
            result.sub_references(),
            &[ObjectHandle::asset("Assets/Spawner.cs", "MonoScript")]
        );
        assert!(matches!(result.detail, ResultDetail::Prefab { .. }));
    }

    #[test]
    fn test_superstring_of_target_is_not_a_reference() {
        let mut catalog = base_catalog();
        catalog.add_file(
            "Assets/Hash.asset",
            "ScriptableObject",
            None,
            format!("--- !u!114 &1\nMonoBehaviour:\n  digest: {}00ff00ff\n", TARGET),
        );

        let session = run(&catalog, CategoryFilter::ASSET, SessionOptions::default());
        assert!(session.results().is_empty());
    }

    #[test]
    fn test_duplicate_field_is_recorded_and_scan_continues() {
        let mut catalog = base_catalog();
        catalog
            .add_file(
                "Assets/Twice.prefab",
                "GameObject",
                None,
                format!(
                    "--- !u!114 &7\nMonoBehaviour:\n  m_Crate: {{fileID: 1, guid: {t}, type: 3}}\n  \
                       m_Crate: {{fileID: 1, guid: {t}, type: 3}}\n",
                    t = TARGET
                ),
            )
            .add_file(
                "Assets/Warehouse.prefab",
                "GameObject",
                None,
                format!(
                    "--- !u!1 &1\nGameObject:\n  m_Name: Warehouse with a much longer name than the smaller prefab\n\
                     --- !u!114 &2\nMonoBehaviour:\n  m_Stock: {{fileID: 1, guid: {}, type: 3}}\n",
                    TARGET
                ),
            );

        let session = run(&catalog, CategoryFilter::PREFAB, SessionOptions::default());

        let paths: Vec<_> = session.results().iter().map(|r| r.path().to_path_buf()).collect();
        assert_eq!(
            paths,
            vec![
                std::path::PathBuf::from("Assets/Twice.prefab"),
                std::path::PathBuf::from("Assets/Warehouse.prefab"),
            ]
        );
        assert_eq!(session.results()[0].hits.len(), 2);
        assert_eq!(
            session.anomalies(),
            &[ScanAnomaly::DuplicateField {
                local_id: "7".to_string(),
                field: "m_Crate".to_string(),
                line: 4,
            }]
        );
    }
}
