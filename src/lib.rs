//! # gfxblock — Graphics Driver Blocklist Rule Engine
//!
//! Decides, for a concrete runtime environment (OS, screen class, battery,
//! windowing protocol, GPU vendor/device, driver vendor and version, refresh
//! rate), whether a graphics feature must be disabled, discouraged, or
//! allowed, by matching the environment against an ordered table of
//! declarative rules.
//!
//! ## Architecture des modules
//!
//! - [`version`] : Représentation compacte des versions de pilotes (u64
//!   empaqueté), politique de padding décimal Windows, opérateurs de
//!   comparaison.
//!
//! - [`device`] : Ensembles d'identifiants de périphériques (ids discrets +
//!   plages inclusives) et familles nommées partagées en singletons.
//!
//! - [`rule`] : Énumérations de prédicats, la structure [`rule::Rule`] et
//!   son builder avec validation des invariants de construction.
//!
//! - [`environment`] : Snapshot immuable de l'environnement d'exécution,
//!   assemblé par l'appelant (jamais sondé ici).
//!
//! - [`table`] : Table de règles ordonnée, gelée après construction ;
//!   évaluation premier-match-gagne, thread-safe en lecture.
//!
//! - [`blocklist`] : La table de règles intégrée, publiée une seule fois.
//!
//! - [`config`] : Configuration TOML — politique de padding, statut par
//!   défaut, règles locales supplémentaires.

pub mod blocklist;
pub mod config;
pub mod device;
pub mod environment;
pub mod rule;
pub mod table;
pub mod version;
