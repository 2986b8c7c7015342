//! Fixture catalog shared by dialogue and API tests.

/// A catalog covering the Dreadheim campaign: the seer's path choice, the
/// elder's welcome (rewarded) and the oath ceremony (rewarded, deferred).
pub const FIXTURE_CATALOG_JSON: &str = r#"{
  "quests": [
    {
      "id": "q_choose_path",
      "title": "The Seer's Question",
      "desc": "The seer waits for your answer.",
      "dialogue": [
        {
          "id": "start",
          "speaker": "Seer",
          "text": "Where does your allegiance lie?",
          "choices": [
            { "text": "With Dreadheim", "next": "dreadheim" },
            { "text": "With Skyreach", "next": "skyreach" },
            { "text": "I cannot say", "next": "nowhere" }
          ]
        },
        {
          "id": "dreadheim",
          "speaker": "Seer",
          "text": "Then the north shall have you.",
          "action": { "type": "setVars", "vars": { "path": "dreadheim" } }
        },
        {
          "id": "skyreach",
          "speaker": "Seer",
          "text": "Then the peaks shall have you.",
          "action": { "type": "setVars", "vars": { "path": "skyreach" } }
        }
      ]
    },
    {
      "id": "q_meet_elder",
      "title": "The Elder's Welcome",
      "desc": "The elder of {path} awaits you in the longhouse.",
      "rewards": {
        "items": [
          { "id": "elder_token", "name": "Elder's Token", "image": "/img/items/elder_token.png", "qty": 1 }
        ]
      },
      "dialogue": [
        {
          "id": "start",
          "speaker": "Elder",
          "text": "Welcome home, child of {path}.",
          "action": { "type": "completeQuest", "next": "q_sign_oath" }
        }
      ]
    },
    {
      "id": "q_sign_oath",
      "title": "Sign the Oath",
      "desc": "Swear the blood oath before the assembled clan.",
      "rewards": {
        "items": [
          { "id": "oath_ring", "name": "Oath Ring", "image": "/img/items/oath_ring.png" },
          { "id": "mead", "name": "Mead", "qty": 2 }
        ]
      },
      "dialogue": [
        {
          "id": "start",
          "speaker": "Elder",
          "text": "Will you swear the oath?",
          "choices": [
            { "text": "I swear it", "next": "sworn" },
            { "text": "Not yet", "next": "later" }
          ]
        },
        {
          "id": "sworn",
          "speaker": "Elder",
          "text": "Sign with your blood.",
          "action": { "type": "completeQuest", "next": "q_raise_banner", "requiresCeremony": true }
        },
        {
          "id": "later",
          "speaker": "Elder",
          "text": "Return when you are ready."
        }
      ]
    }
  ]
}"#;
