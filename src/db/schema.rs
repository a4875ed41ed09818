pub const SCHEMA: &str = r#"
-- poesias table
CREATE TABLE IF NOT EXISTS poesias (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    categoria TEXT NOT NULL,
    titulo TEXT NOT NULL,
    texto_base TEXT NOT NULL,
    conteudo TEXT NOT NULL,
    texto_final TEXT NOT NULL,
    data_criacao INTEGER NOT NULL,
    data_favoritado INTEGER,
    data_leitura INTEGER,
    campo_audio TEXT,
    campo_video TEXT,
    campo_extra TEXT,
    campo_url1 TEXT,
    campo_url2 TEXT,
    imagem TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS index_poesias_categoria ON poesias(categoria);
CREATE INDEX IF NOT EXISTS index_poesias_titulo ON poesias(titulo);
CREATE INDEX IF NOT EXISTS index_poesias_data_criacao ON poesias(data_criacao);
CREATE INDEX IF NOT EXISTS index_poesias_data_favoritado ON poesias(data_favoritado);
CREATE INDEX IF NOT EXISTS index_poesias_data_leitura ON poesias(data_leitura);

-- informativos table
CREATE TABLE IF NOT EXISTS informativos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chave TEXT NOT NULL,
    imagem TEXT,
    titulo TEXT,
    conteudo TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS index_informativos_chave ON informativos(chave);

-- textos table
CREATE TABLE IF NOT EXISTS textos (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    chave TEXT NOT NULL,
    conteudo_html TEXT NOT NULL,
    conteudo_tts TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS index_textos_chave ON textos(chave);
"#;
