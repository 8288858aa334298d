//! Minimal HTML pages. All behavior goes through the JSON API; the token
//! travels in the `HttpOnly` cookie set by `/api/login`.

use axum::response::Html;

const LAYOUT_HEAD: &str = r#"<!doctype html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>Todos</title>
<style>
body { font-family: system-ui, sans-serif; max-width: 40rem; margin: 3rem auto; padding: 0 1rem; }
form { display: grid; gap: .5rem; margin-bottom: 2rem; }
.todo { border: 1px solid #ddd; border-radius: .5rem; padding: .75rem; margin-bottom: .5rem; }
.error { color: #b00020; }
</style>
</head>
<body>
<p id="status" class="error"></p>
"#;

const LAYOUT_TAIL: &str = "</body>\n</html>\n";

const LOGIN_FORM: &str = r#"<h2>Login</h2>
<form id="login">
<input name="email" type="email" placeholder="Email" required>
<input name="password" type="password" placeholder="Password" required>
<button type="submit">Login</button>
</form>
"#;

const REGISTER_FORM: &str = r#"<h2>Register</h2>
<form id="register">
<input name="username" placeholder="Username" required>
<input name="email" type="email" placeholder="Email" required>
<input name="password" type="password" placeholder="Password" required>
<button type="submit">Register</button>
</form>
"#;

const AUTH_SCRIPT: &str = r#"<script>
const statusLine = document.getElementById("status");
async function post(path, form) {
  const body = Object.fromEntries(new FormData(form));
  const res = await fetch(path, { method: "POST", headers: { "content-type": "application/json" }, body: JSON.stringify(body) });
  return [res, await res.json()];
}
const login = document.getElementById("login");
if (login) login.addEventListener("submit", async (e) => {
  e.preventDefault();
  const [res, data] = await post("/api/login", login);
  if (res.ok) { window.location.href = "/dashboard"; } else { statusLine.textContent = data.error; }
});
const register = document.getElementById("register");
if (register) register.addEventListener("submit", async (e) => {
  e.preventDefault();
  const [res, data] = await post("/api/register", register);
  if (res.ok) { window.location.href = "/login"; } else { statusLine.textContent = data.error; }
});
</script>
"#;

const DASHBOARD_BODY: &str = r#"<h1>My Todos</h1>
<button id="logout">Logout</button>
<form id="create">
<input name="title" placeholder="Title" required>
<textarea name="content" placeholder="Content"></textarea>
<button type="submit">Add</button>
</form>
<div id="todos"></div>
<script>
const statusLine = document.getElementById("status");
const list = document.getElementById("todos");
async function api(method, body) {
  const res = await fetch("/api/todo", { method, headers: { "content-type": "application/json" }, body: body ? JSON.stringify(body) : undefined });
  if (res.status === 401) { window.location.href = "/"; return null; }
  const data = await res.json();
  if (!res.ok) { statusLine.textContent = data.error; return null; }
  return data;
}
function render(todos) {
  list.replaceChildren(...todos.map((todo) => {
    const item = document.createElement("div");
    item.className = "todo";
    const title = document.createElement("strong");
    title.textContent = todo.title;
    const content = document.createElement("p");
    content.textContent = todo.content;
    const edit = document.createElement("button");
    edit.textContent = "Edit";
    edit.onclick = async () => {
      const newTitle = prompt("Title", todo.title);
      if (newTitle === null) return;
      const newContent = prompt("Content", todo.content);
      if (await api("PUT", { id: todo.id, title: newTitle, content: newContent ?? todo.content })) refresh();
    };
    const remove = document.createElement("button");
    remove.textContent = "Delete";
    remove.onclick = async () => { if (await api("DELETE", { id: todo.id })) refresh(); };
    item.append(title, content, edit, remove);
    return item;
  }));
}
async function refresh() { const todos = await api("GET"); if (todos) render(todos); }
const create = document.getElementById("create");
create.addEventListener("submit", async (e) => {
  e.preventDefault();
  if (await api("POST", Object.fromEntries(new FormData(create)))) { create.reset(); refresh(); }
});
document.getElementById("logout").onclick = async () => {
  await fetch("/api/logout", { method: "POST" });
  window.location.href = "/";
};
refresh();
</script>
"#;

fn page(body: &[&str]) -> Html<String> {
    let mut html = String::from(LAYOUT_HEAD);
    for part in body {
        html.push_str(part);
    }
    html.push_str(LAYOUT_TAIL);
    Html(html)
}

pub async fn home() -> Html<String> {
    page(&[
        "<h1>Welcome to Todos</h1>\n<p>Organize your life, one task at a time</p>\n",
        LOGIN_FORM,
        REGISTER_FORM,
        AUTH_SCRIPT,
    ])
}

pub async fn login_page() -> Html<String> {
    page(&[LOGIN_FORM, "<p><a href=\"/register\">Create an account</a></p>\n", AUTH_SCRIPT])
}

pub async fn register_page() -> Html<String> {
    page(&[REGISTER_FORM, "<p><a href=\"/login\">Already registered?</a></p>\n", AUTH_SCRIPT])
}

pub async fn dashboard() -> Html<String> {
    page(&[DASHBOARD_BODY])
}
