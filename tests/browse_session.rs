//! End-to-end browsing over a manifest namespace: resolution, navigation
//! history, filtering, change notifications and handle hygiene in one
//! session.

use std::cell::RefCell;
use std::rc::Rc;

use shellscape::{
    Browser, ChangeKind, ChangeRouter, KnownFolderBackend, KnownFolderIndex, MemoryProvider,
    NamespaceProvider, ResolveError, ShellError, ShellItem,
};

const MANIFEST: &str = r#"
[[known_folders]]
name = "Desktop"
special = "desktop"

[[known_folders]]
name = "MyComputerFolder"
special = "computer"

[[known_folders]]
name = "Personal"
display = "Documents"
path = 'C:\Users\ada\Documents'
special = "documents"

[[drives]]
name = "C:"

[[folders]]
path = 'C:\Users\ada\Documents\Projects'

[[files]]
path = 'C:\Users\ada\Documents\notes.txt'

[[files]]
path = 'C:\Users\ada\Documents\report.doc'

[[files]]
path = 'C:\Users\ada\Documents\Projects\readme.md'
"#;

fn open_session() -> (Rc<MemoryProvider>, Browser) {
    let memory = Rc::new(MemoryProvider::from_toml_str(MANIFEST).unwrap());
    let provider: Rc<dyn NamespaceProvider> = memory.clone();
    let browser = Browser::open_desktop(provider).unwrap();
    (memory, browser)
}

fn names_of(browser: &Browser) -> Vec<String> {
    browser
        .entries()
        .unwrap()
        .iter()
        .map(|item| item.display_name().unwrap())
        .collect()
}

#[test_log::test]
fn test_navigation_and_uris_across_one_session() {
    let (memory, mut browser) = open_session();
    assert_eq!(names_of(&browser), ["Computer"]);

    browser.navigate_to("shell:///Personal").unwrap();
    assert_eq!(browser.current().display_name().unwrap(), "Documents");
    assert_eq!(names_of(&browser), ["Projects", "notes.txt", "report.doc"]);

    browser
        .navigate_to(r"C:\Users\ada\Documents\Projects")
        .unwrap();
    let uri = browser.current().to_uri().unwrap();
    assert_eq!(uri.to_string(), "shell:///Personal/Projects");

    // The URI resolves back to the same item.
    let again = ShellItem::from_uri(Rc::clone(browser.provider()), &uri).unwrap();
    assert_eq!(again, *browser.current());

    browser.back().unwrap();
    assert_eq!(browser.current().display_name().unwrap(), "Documents");
    assert!(browser.can_go_forward());
    browser.forward().unwrap();
    assert_eq!(browser.current().display_name().unwrap(), "Projects");

    browser.up().unwrap();
    assert_eq!(browser.current().display_name().unwrap(), "Documents");
    assert!(!browser.can_go_forward());

    drop(again);
    drop(browser);
    assert_eq!(memory.outstanding_handles(), 0);
}

#[test_log::test]
fn test_failed_navigation_keeps_the_session_in_place() {
    let (_memory, mut browser) = open_session();
    browser.navigate_to("shell:///Personal").unwrap();

    let error = browser
        .navigate_to(r"C:\Users\ada\Documents\notes.txt")
        .unwrap_err();
    assert!(matches!(
        error,
        ShellError::Resolve(ResolveError::InvalidLocator(_))
    ));

    assert_eq!(browser.current().display_name().unwrap(), "Documents");
    assert_eq!(browser.history().len(), 2);
}

#[test_log::test]
fn test_filtering_narrows_the_view() {
    let (_memory, mut browser) = open_session();
    browser.navigate_to("shell:///Personal").unwrap();

    browser
        .set_filter("Documents|*.doc|All files|*.*", "*.doc")
        .unwrap();
    assert_eq!(browser.selected_filter_index(), Some(0));
    assert_eq!(names_of(&browser), ["Projects", "report.doc"]);

    browser.select_pattern("*.*").unwrap();
    assert_eq!(browser.selected_filter_index(), Some(1));
    assert_eq!(names_of(&browser), ["Projects", "notes.txt", "report.doc"]);

    browser.clear_filter();
    assert!(browser.filter_spec().is_none());
}

#[test_log::test]
fn test_changes_flow_from_mutations_to_subscribers() {
    let (memory, mut browser) = open_session();
    browser.navigate_to("shell:///Personal").unwrap();

    let seen: Rc<RefCell<Vec<String>>> = Rc::default();
    let mut router = ChangeRouter::new();
    let created = Rc::clone(&seen);
    router.subscribe(ChangeKind::ItemCreated, move |event| {
        created
            .borrow_mut()
            .push(format!("created {}", event.item.display_name().unwrap()));
    });
    let renamed = Rc::clone(&seen);
    router.subscribe(ChangeKind::ItemRenamed, move |event| {
        let new_name = event.other.as_ref().unwrap().display_name().unwrap();
        renamed.borrow_mut().push(format!(
            "renamed {} to {new_name}",
            event.item.display_name().unwrap()
        ));
    });

    memory.create_file(r"C:\Users\ada\Documents\draft.txt").unwrap();
    memory
        .rename(r"C:\Users\ada\Documents\draft.txt", "final.txt")
        .unwrap();

    let delivered = router.dispatch_all(MemoryProvider::drain_notifications(&memory));
    assert_eq!(delivered, 2);
    assert_eq!(
        seen.borrow().as_slice(),
        [
            "created draft.txt".to_string(),
            "renamed draft.txt to final.txt".to_string(),
        ]
    );

    // The session sees the mutated folder on the next enumeration.
    assert_eq!(
        names_of(&browser),
        ["Projects", "final.txt", "notes.txt", "report.doc"]
    );

    drop(browser);
    assert_eq!(memory.outstanding_handles(), 0);
}

#[test_log::test]
fn test_known_folder_index_reflects_the_manifest() {
    let (_memory, browser) = open_session();

    let index = KnownFolderIndex::for_provider(Rc::clone(browser.provider()));
    assert_eq!(index.backend(), KnownFolderBackend::Enumerated);
    assert_eq!(
        index.names().collect::<Vec<_>>(),
        ["Desktop", "MyComputerFolder", "Personal"]
    );

    let documents = index.by_name("personal").unwrap();
    assert_eq!(documents.display_name().unwrap(), "Documents");
    assert_eq!(
        documents.file_system_path().unwrap().as_deref(),
        Some(r"C:\Users\ada\Documents")
    );
}

#[cfg(feature = "host")]
#[test_log::test]
fn test_host_directory_session() {
    use shellscape::HostProvider;

    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("inbox")).unwrap();
    std::fs::write(dir.path().join("inbox").join("todo.txt"), b"later").unwrap();
    std::fs::write(dir.path().join("readme.md"), b"hello").unwrap();

    let host = Rc::new(HostProvider::new(dir.path()).unwrap());
    let provider: Rc<dyn NamespaceProvider> = host.clone();
    let mut browser = Browser::open_desktop(provider).unwrap();
    assert_eq!(names_of(&browser), ["inbox", "readme.md"]);

    // Child lookup tolerates a case mismatch.
    let inbox = browser.current().child("INBOX").unwrap();
    browser.navigate(inbox).unwrap();
    assert_eq!(names_of(&browser), ["todo.txt"]);

    browser.up().unwrap();
    drop(browser);
    assert_eq!(host.outstanding_handles(), 0);
}
