//! Template files every project is committed with.
//!
//! Project files override these on path collision. `/README.md` doubles as
//! the branch bootstrap placeholder, so a first sync replaces it.

use reposync_core::ProjectFileSet;

const README: &str = "# dApp project\n\nGenerated and published with reposync.\n";

const PACKAGE_JSON: &str = r#"{
  "name": "dapp",
  "private": true,
  "version": "0.0.0",
  "type": "module",
  "scripts": {
    "dev": "vite",
    "build": "vite build",
    "preview": "vite preview"
  },
  "dependencies": {
    "react": "^18.2.0",
    "react-dom": "^18.2.0"
  },
  "devDependencies": {
    "@vitejs/plugin-react": "^4.2.0",
    "vite": "^5.0.0"
  }
}
"#;

const VITE_CONFIG: &str = r#"import { defineConfig } from "vite";
import react from "@vitejs/plugin-react";

export default defineConfig({
  plugins: [react()],
  base: "./",
});
"#;

const MAIN_JSX: &str = r#"import React from "react";
import ReactDOM from "react-dom/client";
import App from "./App";

ReactDOM.createRoot(document.getElementById("root")).render(
  <React.StrictMode>
    <App />
  </React.StrictMode>
);
"#;

/// The built-in template set.
pub fn builtin() -> ProjectFileSet {
    [
        ("/README.md", README),
        ("/package.json", PACKAGE_JSON),
        ("/vite.config.js", VITE_CONFIG),
        ("/src/main.jsx", MAIN_JSX),
    ]
    .into_iter()
    .collect()
}
