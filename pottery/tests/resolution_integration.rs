//! End-to-end resolution against an in-memory repository.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use pottery::coordinate::DirectDependency;
use pottery::resolver::{
    DependencyResolver, HttpClient, RepositoryError, Resolution, ResolverConfig,
};
use tempfile::TempDir;

const REPO: &str = "http://repo.test/maven2";

/// Serves canned documents; every other URL is a 404.
#[derive(Default)]
struct InMemoryRepository {
    documents: HashMap<String, Vec<u8>>,
    delays: HashMap<String, Duration>,
    requests: Mutex<Vec<String>>,
}

impl InMemoryRepository {
    fn pom(mut self, group: &str, artifact: &str, version: &str, body: &str) -> Self {
        self.documents.insert(
            pom_url(group, artifact, version),
            format!("<project>{}</project>", body).into_bytes(),
        );
        self
    }

    /// Answer requests for this metadata document only after `delay`.
    fn slow_pom(mut self, group: &str, artifact: &str, version: &str, delay: Duration) -> Self {
        self.delays.insert(pom_url(group, artifact, version), delay);
        self
    }

    fn jar(mut self, group: &str, artifact: &str, version: &str, contents: &str) -> Self {
        self.documents
            .insert(jar_url(group, artifact, version), contents.as_bytes().to_vec());
        self
    }

    fn request_count(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|u| *u == url).count()
    }
}

impl HttpClient for InMemoryRepository {
    fn get(&self, url: &str) -> Result<Vec<u8>, RepositoryError> {
        self.requests.lock().push(url.to_string());
        if let Some(delay) = self.delays.get(url) {
            thread::sleep(*delay);
        }
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| RepositoryError::NotFound {
                url: url.to_string(),
            })
    }
}

fn pom_url(group: &str, artifact: &str, version: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}-{}.pom",
        REPO,
        group.replace('.', "/"),
        artifact,
        version,
        artifact,
        version
    )
}

fn jar_url(group: &str, artifact: &str, version: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}-{}.jar",
        REPO,
        group.replace('.', "/"),
        artifact,
        version,
        artifact,
        version
    )
}

fn dependency(group: &str, artifact: &str, version: &str) -> String {
    format!(
        "<dependency><groupId>{}</groupId><artifactId>{}</artifactId><version>{}</version></dependency>",
        group, artifact, version
    )
}

fn resolve(
    cache: &Path,
    repository: Arc<InMemoryRepository>,
    dependencies: &[DirectDependency],
    include_tests: bool,
) -> Resolution {
    let config = ResolverConfig::new(cache)
        .with_repository(REPO)
        .with_workers(4)
        .with_test_dependencies(include_tests);
    DependencyResolver::new(config, repository)
        .resolve(dependencies)
        .unwrap()
}

fn resolved_names(resolution: &Resolution) -> Vec<String> {
    resolution
        .artifacts
        .iter()
        .map(|a| a.coordinate.to_string())
        .collect()
}

fn cached(cache: &Path, group: &str, artifact: &str, version: &str) -> PathBuf {
    let mut path = cache.to_path_buf();
    path.extend(group.split('.'));
    path.join(artifact)
        .join(version)
        .join(format!("{}-{}.jar", artifact, version))
}

#[test]
fn test_direct_and_transitive_dependency() {
    let temp = TempDir::new().unwrap();
    let repository = Arc::new(
        InMemoryRepository::default()
            .pom(
                "io.example",
                "lib",
                "1.0.0",
                &format!(
                    "<dependencies>{}</dependencies>",
                    dependency("io.example", "util", "1.0.0")
                ),
            )
            .jar("io.example", "lib", "1.0.0", "lib")
            .jar("io.example", "util", "1.0.0", "util"),
    );

    let resolution = resolve(
        temp.path(),
        repository,
        &[DirectDependency::production("io.example:lib:1.0.0")],
        false,
    );

    assert_eq!(
        resolved_names(&resolution),
        vec!["io.example:lib:1.0.0", "io.example:util:1.0.0"]
    );
    assert_eq!(
        resolution.artifacts[0].path,
        temp.path().join("io/example/lib/1.0.0/lib-1.0.0.jar")
    );
    assert_eq!(
        resolution.artifacts[1].path,
        temp.path().join("io/example/util/1.0.0/util-1.0.0.jar")
    );
    assert_eq!(fs::read_to_string(&resolution.artifacts[1].path).unwrap(), "util");
    assert_eq!(resolution.stats.artifacts_downloaded, 2);
    assert_eq!(resolution.stats.failures, 0);
}

#[test]
fn test_parent_property_resolves_in_child() {
    let temp = TempDir::new().unwrap();
    let repository = Arc::new(
        InMemoryRepository::default()
            .pom(
                "io.example",
                "parent-pom",
                "1.0.0",
                "<properties><shared.version>2.0.0</shared.version></properties>",
            )
            .pom(
                "io.example",
                "lib",
                "1.0.0",
                &format!(
                    "<parent><groupId>io.example</groupId><artifactId>parent-pom</artifactId>\
                     <version>1.0.0</version></parent><artifactId>lib</artifactId>\
                     <dependencies>{}</dependencies>",
                    dependency("io.example", "util", "${shared.version}")
                ),
            )
            .jar("io.example", "lib", "1.0.0", "lib")
            .jar("io.example", "util", "2.0.0", "util"),
    );

    let resolution = resolve(
        temp.path(),
        repository,
        &[DirectDependency::production("io.example:lib:1.0.0")],
        false,
    );

    assert_eq!(
        resolved_names(&resolution),
        vec!["io.example:lib:1.0.0", "io.example:util:2.0.0"]
    );
    assert!(resolution.stats.requeues >= 1);
}

#[test]
fn test_snapshot_is_refetched_and_release_is_not() {
    let temp = TempDir::new().unwrap();
    let snapshot = cached(temp.path(), "io.example", "lib", "1.0.0-SNAPSHOT");
    let release = cached(temp.path(), "io.example", "util", "1.0.0");
    for path in [&snapshot, &release] {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "old").unwrap();
    }

    let repository = Arc::new(
        InMemoryRepository::default()
            .jar("io.example", "lib", "1.0.0-SNAPSHOT", "new")
            .jar("io.example", "util", "1.0.0", "new"),
    );

    let resolution = resolve(
        temp.path(),
        Arc::clone(&repository),
        &[
            DirectDependency::production("io.example:lib:1.0.0-SNAPSHOT"),
            DirectDependency::production("io.example:util:1.0.0"),
        ],
        false,
    );

    assert_eq!(resolution.artifacts.len(), 2);
    assert_eq!(fs::read_to_string(&snapshot).unwrap(), "new");
    assert_eq!(fs::read_to_string(&release).unwrap(), "old");
    assert_eq!(
        repository.request_count(&jar_url("io.example", "util", "1.0.0")),
        0
    );
    assert_eq!(resolution.stats.artifacts_cached, 1);
}

#[test]
fn test_transitive_test_dependency_is_excluded() {
    let temp = TempDir::new().unwrap();
    let repository = Arc::new(InMemoryRepository::default().pom(
        "io.example",
        "lib",
        "1.0.0",
        "<dependencies><dependency><groupId>org.junit</groupId><artifactId>junit</artifactId>\
         <version>4.13.2</version><scope>test</scope></dependency></dependencies>",
    ));

    let resolution = resolve(
        temp.path(),
        Arc::clone(&repository),
        &[
            DirectDependency::production("io.example:lib:1.0.0"),
            DirectDependency::test("org.hamcrest:hamcrest:2.2"),
        ],
        true,
    );

    let names = resolved_names(&resolution);
    assert!(!names.iter().any(|n| n.starts_with("org.junit:junit")));
    assert!(names.contains(&"org.hamcrest:hamcrest:2.2".to_string()));
}

#[test]
fn test_direct_declaration_survives_blocked_transitive_test_scope() {
    let temp = TempDir::new().unwrap();
    let repository = Arc::new(InMemoryRepository::default().pom(
        "io.example",
        "lib",
        "1.0.0",
        "<dependencies><dependency><groupId>io.example</groupId><artifactId>util</artifactId>\
         <version>1.0.0</version><scope>test</scope></dependency></dependencies>",
    ));

    let resolution = resolve(
        temp.path(),
        repository,
        &[
            DirectDependency::production("io.example:lib:1.0.0"),
            DirectDependency::production("io.example:util:1.0.0"),
        ],
        false,
    );

    let util: Vec<_> = resolution
        .artifacts
        .iter()
        .filter(|a| a.coordinate.artifact() == "util")
        .collect();
    assert_eq!(util.len(), 1);
    assert_eq!(util[0].coordinate.scope().as_str(), "compile");
}

#[test]
fn test_direct_test_dependencies_follow_flag() {
    let temp = TempDir::new().unwrap();
    let deps = [DirectDependency::test("org.junit:junit:4.13.2")];

    let excluded = resolve(
        temp.path(),
        Arc::new(InMemoryRepository::default()),
        &deps,
        false,
    );
    assert!(excluded.artifacts.is_empty());

    let included = resolve(
        temp.path(),
        Arc::new(InMemoryRepository::default()),
        &deps,
        true,
    );
    assert_eq!(resolved_names(&included), vec!["org.junit:junit:4.13.2"]);
}

#[test]
fn test_managed_version_fills_unversioned_dependency() {
    let temp = TempDir::new().unwrap();
    let repository = Arc::new(InMemoryRepository::default().pom(
        "io.example",
        "lib",
        "1.0.0",
        &format!(
            "<properties><util.version>3.1.0</util.version></properties>\
             <dependencyManagement><dependencies>{}</dependencies></dependencyManagement>\
             <dependencies><dependency><groupId>io.example</groupId>\
             <artifactId>util</artifactId></dependency></dependencies>",
            dependency("io.example", "util", "${util.version}")
        ),
    ));

    let resolution = resolve(
        temp.path(),
        repository,
        &[DirectDependency::production("io.example:lib:1.0.0")],
        false,
    );

    assert_eq!(
        resolved_names(&resolution),
        vec!["io.example:lib:1.0.0", "io.example:util:3.1.0"]
    );
}

#[test]
fn test_shared_dependency_appears_once() {
    let temp = TempDir::new().unwrap();
    let shared = format!(
        "<dependencies>{}</dependencies>",
        dependency("io.example", "util", "1.0.0")
    );
    let repository = Arc::new(
        InMemoryRepository::default()
            .pom("io.example", "lib", "1.0.0", &shared)
            .pom("io.example", "app", "1.0.0", &shared)
            .jar("io.example", "util", "1.0.0", "util"),
    );

    let resolution = resolve(
        temp.path(),
        Arc::clone(&repository),
        &[
            DirectDependency::production("io.example:lib:1.0.0"),
            DirectDependency::production("io.example:app:1.0.0"),
        ],
        false,
    );

    let names = resolved_names(&resolution);
    assert_eq!(
        names.iter().filter(|n| *n == "io.example:util:1.0.0").count(),
        1
    );
    assert_eq!(
        repository.request_count(&jar_url("io.example", "util", "1.0.0")),
        1
    );
}

#[test]
fn test_highest_compatible_patch_wins() {
    let temp = TempDir::new().unwrap();
    let repository = Arc::new(InMemoryRepository::default().pom(
        "io.example",
        "lib",
        "1.0.0",
        &format!(
            "<dependencies>{}</dependencies>",
            dependency("io.example", "util", "1.2.7")
        ),
    ));

    let resolution = resolve(
        temp.path(),
        repository,
        &[
            DirectDependency::production("io.example:lib:1.0.0"),
            DirectDependency::production("io.example:util:1.2.3"),
        ],
        false,
    );

    assert!(resolved_names(&resolution).contains(&"io.example:util:1.2.7".to_string()));
    assert_eq!(resolution.stats.version_conflicts, 1);
}

#[test]
fn test_missing_parent_does_not_block_run() {
    let temp = TempDir::new().unwrap();
    let repository = Arc::new(InMemoryRepository::default().pom(
        "io.example",
        "lib",
        "1.0.0",
        &format!(
            "<parent><groupId>io.example</groupId><artifactId>gone</artifactId>\
             <version>1.0.0</version></parent><dependencies>{}</dependencies>",
            dependency("io.example", "util", "1.0.0")
        ),
    ));

    let resolution = resolve(
        temp.path(),
        repository,
        &[DirectDependency::production("io.example:lib:1.0.0")],
        false,
    );

    assert_eq!(
        resolved_names(&resolution),
        vec!["io.example:lib:1.0.0", "io.example:util:1.0.0"]
    );
}

#[test]
fn test_range_version_is_pinned() {
    let temp = TempDir::new().unwrap();
    let repository =
        Arc::new(InMemoryRepository::default().jar("io.example", "lib", "2.0", "lib"));

    let resolution = resolve(
        temp.path(),
        Arc::clone(&repository),
        &[DirectDependency::production("io.example:lib:[1.0,2.0)")],
        false,
    );

    assert_eq!(resolved_names(&resolution), vec!["io.example:lib:2.0"]);
    assert!(resolution.artifacts[0].path.exists());
}

#[test]
fn test_second_run_uses_cache() {
    let temp = TempDir::new().unwrap();
    let repository = Arc::new(
        InMemoryRepository::default()
            .pom("io.example", "lib", "1.0.0", "")
            .jar("io.example", "lib", "1.0.0", "lib"),
    );
    let deps = [DirectDependency::production("io.example:lib:1.0.0")];

    resolve(temp.path(), Arc::clone(&repository), &deps, false);
    let second = resolve(temp.path(), Arc::clone(&repository), &deps, false);

    assert_eq!(second.stats.metadata_cached, 1);
    assert_eq!(second.stats.metadata_downloaded, 0);
    assert_eq!(second.stats.artifacts_cached, 1);
    assert_eq!(second.stats.artifacts_downloaded, 0);
}

#[test]
fn test_siblings_wait_for_slow_parent() {
    let temp = TempDir::new().unwrap();
    let parent = "<parent><groupId>io.example</groupId><artifactId>parent-pom</artifactId>\
                  <version>1.0.0</version></parent>";
    let mut repository = InMemoryRepository::default()
        .pom(
            "io.example",
            "parent-pom",
            "1.0.0",
            "<properties><shared.version>2.0.0</shared.version></properties>",
        )
        .slow_pom("io.example", "parent-pom", "1.0.0", Duration::from_millis(300));
    for child in ["a", "b", "c"] {
        repository = repository.pom(
            "io.example",
            child,
            "1.0.0",
            &format!(
                "{}<dependencies>{}</dependencies>",
                parent,
                dependency("io.example", &format!("util-{}", child), "${shared.version}")
            ),
        );
    }

    let config = ResolverConfig::new(temp.path())
        .with_repository(REPO)
        .with_workers(2);
    let resolution = DependencyResolver::new(config, Arc::new(repository))
        .resolve(&[
            DirectDependency::production("io.example:a:1.0.0"),
            DirectDependency::production("io.example:b:1.0.0"),
            DirectDependency::production("io.example:c:1.0.0"),
        ])
        .unwrap();

    let names = resolved_names(&resolution);
    for util in ["util-a", "util-b", "util-c"] {
        assert!(
            names.contains(&format!("io.example:{}:2.0.0", util)),
            "missing {} in {:?}",
            util,
            names
        );
    }
    assert!(names.iter().all(|n| !n.contains("${")), "{:?}", names);
    assert!(resolution.stats.requeues < 20, "requeues: {}", resolution.stats.requeues);
}
