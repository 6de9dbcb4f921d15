#![forbid(unsafe_code)]

//! End-to-end behavior of the provider, the dictionary accessor and the
//! reactive wrapper working together.
//!
//! 1. `startup` – initial locale selection and resolution
//! 2. `set_locale` – idempotence, rejection and persistence
//! 3. `memo` – the reactive wrapper's use of the content store
//! 4. `dispatch` – plugin ordering through the accessor

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lingua_i18n::{
    ContentNode, ContentStore, CookieJar, CookieJarPersistence, Dictionary, DictionarySource,
    I18nRuntime, InMemoryStore, IntlayerConfig, Locale, LocalePersistence, MemoryPersistence,
    Plugin, Rendered, View, get_dictionary, use_dictionary, use_intlayer, use_intlayer_context,
};
use lingua_reactive::Observable;
use serde_json::json;

fn config() -> IntlayerConfig {
    IntlayerConfig::with_locales("en", &["en", "fr", "es"])
}

fn landing() -> Dictionary {
    Dictionary::new(
        "landing",
        ContentNode::from(json!({
            "title": {
                "nodeType": "translation",
                "translation": { "en": "Welcome", "fr": "Bienvenue", "es": "Bienvenido" }
            },
            "body": { "nodeType": "markdown", "content": "---\ntitle: Intro\n---\n**Hi**" },
            "visits": 42,
            "beta": false
        })),
    )
}

/// Store wrapper counting content-engine calls.
struct CountingStore {
    inner: InMemoryStore,
    calls: Rc<Cell<u32>>,
}

impl ContentStore for CountingStore {
    fn content(&self, source: DictionarySource<'_>, locale: &Locale) -> Option<ContentNode> {
        self.calls.set(self.calls.get() + 1);
        self.inner.content(source, locale)
    }
}

fn counting_runtime(persistence: MemoryPersistence) -> (I18nRuntime, Rc<Cell<u32>>) {
    let calls = Rc::new(Cell::new(0));
    let config = config();
    let store = CountingStore {
        inner: InMemoryStore::from_config(&config).with_dictionary(landing()),
        calls: Rc::clone(&calls),
    };
    (I18nRuntime::new(config, store, persistence), calls)
}

mod startup {
    use super::*;

    #[test]
    fn requested_regional_locale_resolves_to_language() {
        let jar = CookieJar::new();
        let cookie = CookieJarPersistence::new("intlayer-locale", jar.clone());
        let runtime = I18nRuntime::new(config(), InMemoryStore::from_config(&config()), cookie);

        let scope = runtime.root_scope().mount(runtime.provider().with_locale("fr-CA"));
        assert_eq!(use_intlayer_context(&scope).locale(), "fr");
        assert!(jar.is_empty());
    }

    #[test]
    fn cookie_beats_default_prop() {
        let jar = CookieJar::from_header("intlayer-locale=es");
        let cookie = CookieJarPersistence::new("intlayer-locale", jar);
        let runtime = I18nRuntime::new(config(), InMemoryStore::from_config(&config()), cookie);
        let ctx = runtime.provider().with_default_locale("fr").create();
        assert_eq!(ctx.locale(), "es");
    }

    #[test]
    fn unknown_cookie_falls_back_to_first_available() {
        let runtime = I18nRuntime::new(
            IntlayerConfig::with_locales("fr", &["fr", "en"]),
            InMemoryStore::new(Locale::new("fr")),
            MemoryPersistence::with_locale("de-AT"),
        );
        assert_eq!(runtime.provider().create().locale(), "fr");
    }
}

mod set_locale {
    use super::*;

    #[test]
    fn second_identical_call_is_a_no_op() {
        let cookie = MemoryPersistence::new();
        let (runtime, _) = counting_runtime(cookie.clone());
        let ctx = runtime.provider().create();
        let transitions = Rc::new(Cell::new(0u32));
        let count = Rc::clone(&transitions);
        let _sub = ctx.subscribe(move |_| count.set(count.get() + 1));

        ctx.set_locale("es");
        ctx.set_locale("es");

        assert_eq!(transitions.get(), 1);
        assert_eq!(cookie.writes(), 1);
    }

    #[test]
    fn rejected_locale_leaves_state_and_storage_alone() {
        let cookie = MemoryPersistence::new();
        let (runtime, _) = counting_runtime(cookie.clone());
        let ctx = runtime.provider().create();

        ctx.set_locale("ja");

        assert_eq!(ctx.locale(), "en");
        assert_eq!(cookie.writes(), 0);
        assert_eq!(cookie.read(), None);
    }

    #[test]
    fn all_consumers_observe_the_change() {
        let (runtime, _) = counting_runtime(MemoryPersistence::new());
        let scope = runtime.root_scope().mount(runtime.provider());
        let header = use_intlayer(&scope.child(), "landing", None);
        let footer = use_intlayer(&scope.child().child(), "landing", None);

        use_intlayer_context(&scope.child()).set_locale("fr");

        for cell in [&header, &footer] {
            let title = cell.get().at("title").map(Rendered::plain_text);
            assert_eq!(title.as_deref(), Some("Bienvenue"));
        }
    }
}

mod memo {
    use super::*;

    #[test]
    fn unchanged_inputs_do_not_hit_the_store_again() {
        let (runtime, calls) = counting_runtime(MemoryPersistence::new());
        let scope = runtime.root_scope().mount(runtime.provider());
        let cell = use_intlayer(&scope, "landing", None);

        let first = cell.get();
        let second = cell.get();
        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn locale_change_recomputes_exactly_once() {
        let (runtime, calls) = counting_runtime(MemoryPersistence::new());
        let scope = runtime.root_scope().mount(runtime.provider());
        let cell = use_intlayer(&scope, "landing", None);
        let _ = cell.get();

        let ctx = use_intlayer_context(&scope);
        ctx.set_locale("fr");
        ctx.set_locale("fr");
        let _ = cell.get();
        let _ = cell.get();

        assert_eq!(calls.get(), 2);
        assert_eq!(cell.version(), 2);
    }

    #[test]
    fn subscribed_cell_pushes_fresh_content() {
        let (runtime, calls) = counting_runtime(MemoryPersistence::new());
        let scope = runtime.root_scope().mount(runtime.provider());
        let cell = use_intlayer(&scope, "landing", None);
        let titles = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&titles);
        let _sub = cell.subscribe(move |tree| {
            let title = tree.at("title").map(Rendered::plain_text);
            sink.borrow_mut().push(title.unwrap_or_default());
        });

        let ctx = use_intlayer_context(&scope);
        ctx.set_locale("es");
        ctx.set_locale("fr");

        assert_eq!(
            *titles.borrow(),
            vec!["Bienvenido".to_string(), "Bienvenue".to_string()]
        );
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn dictionary_replacement_invalidates() {
        let (runtime, calls) = counting_runtime(MemoryPersistence::new());
        let scope = runtime.root_scope().mount(runtime.provider());
        let dictionary = Observable::new(landing());
        let cell = use_dictionary(&scope, &dictionary, Some(Locale::new("es")));

        assert_eq!(
            cell.get().at("title").map(Rendered::plain_text).as_deref(),
            Some("Bienvenido")
        );
        dictionary.set(landing());
        let _ = cell.get();
        assert_eq!(calls.get(), 1);

        let replacement = ContentNode::map([("title", "Hola")]);
        dictionary.set(Dictionary::new("landing", replacement));
        assert_eq!(
            cell.get().at("title").map(Rendered::plain_text).as_deref(),
            Some("Hola")
        );
        assert_eq!(calls.get(), 2);
    }
}

mod dispatch {
    use super::*;

    #[test]
    fn each_node_kind_reaches_its_plugin() {
        let store = InMemoryStore::from_config(&config());
        let out = get_dictionary(&landing(), &Locale::new("en"), &[], &store);

        assert!(matches!(out.get("title"), Some(Rendered::View(View::Selector(_)))));
        assert_eq!(
            out.at("visits").map(Rendered::plain_text).as_deref(),
            Some("42")
        );
        let Some(Rendered::View(View::Markdown(md))) = out.get("body") else {
            panic!("expected markdown body, got {out:?}");
        };
        assert_eq!(md.metadata.title.as_deref(), Some("Intro"));
        assert_eq!(md.body(), "**Hi**");
        assert_eq!(
            out.get("beta"),
            Some(&Rendered::Content(ContentNode::from(false)))
        );
    }

    #[test]
    fn caller_extras_never_override_defaults() {
        let store = InMemoryStore::from_config(&config());
        let shout = Plugin::custom(
            "shout",
            |node| matches!(node, ContentNode::Primitive(_)),
            |node, _, _| match node {
                ContentNode::Primitive(p) => Rendered::View(View::text(p.to_text().to_uppercase())),
                _ => Rendered::default(),
            },
        );
        let out = get_dictionary(&landing(), &Locale::new("en"), &[shout], &store);

        assert_eq!(
            out.at("title").map(Rendered::plain_text).as_deref(),
            Some("Welcome")
        );
        assert_eq!(
            out.at("beta").map(Rendered::plain_text).as_deref(),
            Some("FALSE")
        );
    }
}
